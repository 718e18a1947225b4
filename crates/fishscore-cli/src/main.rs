//! fishscore CLI — command-line interface for FISH cell and
//! chromosome-signal scoring.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use fishscore::{CellClass, CellDetector, ChannelRole, DetectorConfig, PrecomputedMasks};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "fishscore")]
#[command(about = "Score cells and red/green chromosome signals in FISH microscope images")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect cells and chromosome signals in an image.
    Detect(CliDetectArgs),

    /// Print statistics about a precomputed mask file.
    MasksInfo {
        /// Path to the mask file (JSON, `fishscore.masks.v1`).
        #[arg(long)]
        masks: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct CliDetectArgs {
    /// Path to the input image (RGB or RGBA).
    #[arg(long)]
    image: PathBuf,

    /// Path to precomputed segmentation masks (JSON, `fishscore.masks.v1`).
    #[arg(long)]
    masks: PathBuf,

    /// Path to write the detection report (JSON).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Segmentation confidence cutoff.
    #[arg(long, default_value = "0.5")]
    confidence: f32,

    /// Border-exclusion tolerance in pixels for chromosome assignment.
    #[arg(long, default_value = "1.0")]
    closeness: f64,

    /// Binary cutoff for chromosome signal extraction (per channel).
    #[arg(long, default_value = "100")]
    signal_cutoff: u8,

    /// Unsharp masking gain.
    #[arg(long, default_value = "5.0")]
    unsharp_amount: f32,

    /// Unsharp masking Gaussian sigma.
    #[arg(long, default_value = "5.0")]
    unsharp_sigma: f32,

    /// Unsharp masking low-contrast suppression threshold (0 disables).
    #[arg(long, default_value = "100.0")]
    unsharp_threshold: f32,

    /// Background color RGBA inputs are composited onto, as "R,G,B".
    #[arg(long, default_value = "255,255,255", value_parser = parse_rgb)]
    background: [u8; 3],
}

impl CliDetectArgs {
    fn to_config(&self) -> DetectorConfig {
        let mut config = DetectorConfig {
            confidence: self.confidence,
            closeness: self.closeness,
            background: self.background,
            ..Default::default()
        };
        config.candidates.signal_cutoff = self.signal_cutoff;
        config.unsharp.amount = self.unsharp_amount;
        config.unsharp.sigma = self.unsharp_sigma;
        config.unsharp.threshold = self.unsharp_threshold;
        config
    }
}

fn parse_rgb(raw: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected \"R,G,B\", got '{raw}'"));
    }
    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse()
            .map_err(|e| format!("invalid channel value '{part}': {e}"))?;
    }
    Ok(rgb)
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::MasksInfo { masks } => run_masks_info(&masks),
    }
}

fn run_detect(args: &CliDetectArgs) -> CliResult<()> {
    let image = image::ImageReader::open(&args.image)?.decode()?;
    let oracle = PrecomputedMasks::from_json_file(&args.masks)?;

    let detector = CellDetector::with_config(&oracle, args.to_config());
    let detection = detector.detect(&image)?;
    let counts = detection.registry.counts();

    println!("Whole: {}", counts.whole);
    println!("Exploded: {}", counts.exploded);
    println!(
        "Red chromosomes: {} ({} candidates dropped)",
        detection.registry.chromosome_total(ChannelRole::Red),
        detection.tally.red.dropped
    );
    println!(
        "Green chromosomes: {} ({} candidates dropped)",
        detection.registry.chromosome_total(ChannelRole::Green),
        detection.tally.green.dropped
    );

    if let Some(out) = &args.out {
        let json = serde_json::to_string_pretty(&detection.report())?;
        std::fs::write(out, json)?;
        println!("Wrote {}", out.display());
    }
    Ok(())
}

fn run_masks_info(path: &std::path::Path) -> CliResult<()> {
    let store = PrecomputedMasks::from_json_file(path)?;

    println!("fishscore mask file: {}", path.display());
    println!("  instances: {}", store.instances().len());
    for (idx, inst) in store.instances().iter().enumerate() {
        let (w, h) = inst.mask.dimensions();
        let class = match CellClass::from_class_id(inst.class_id) {
            Ok(CellClass::Whole) => "whole",
            Ok(CellClass::Exploded) => "exploded",
            Err(_) => "unknown",
        };
        println!(
            "  [{idx}] class: {class} (id {}), confidence: {:.2}, native size: {w}x{h}",
            inst.class_id, inst.confidence
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rgb_accepts_triples() {
        assert_eq!(parse_rgb("255,255,255").unwrap(), [255, 255, 255]);
        assert_eq!(parse_rgb("0, 128, 7").unwrap(), [0, 128, 7]);
    }

    #[test]
    fn parse_rgb_rejects_malformed_input() {
        assert!(parse_rgb("255,255").is_err());
        assert!(parse_rgb("255,255,256").is_err());
        assert!(parse_rgb("red,green,blue").is_err());
    }

    #[test]
    fn detect_args_map_onto_config() {
        let cli = Cli::try_parse_from([
            "fishscore",
            "detect",
            "--image",
            "slide.png",
            "--masks",
            "masks.json",
            "--closeness",
            "2.5",
            "--signal-cutoff",
            "80",
        ])
        .expect("valid argv");
        let Commands::Detect(args) = cli.command else {
            panic!("expected detect subcommand");
        };
        let config = args.to_config();
        assert_eq!(config.closeness, 2.5);
        assert_eq!(config.candidates.signal_cutoff, 80);
        assert_eq!(config.confidence, 0.5);
        assert_eq!(config.background, [255, 255, 255]);
    }
}
