use std::error::Error;
use std::path::Path;

use fishscore::{CellDetector, ChannelRole, PrecomputedMasks};
use image::ImageReader;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <image.png> <masks.json> [out.json]", args[0]);
        std::process::exit(2);
    }

    let image = ImageReader::open(&args[1])?.decode()?;
    let oracle = PrecomputedMasks::from_json_file(Path::new(&args[2]))?;

    let detector = CellDetector::new(&oracle);
    let detection = detector.detect(&image)?;

    let counts = detection.registry.counts();
    println!(
        "{} cells ({} whole, {} exploded); {} red / {} green chromosomes",
        detection.registry.len(),
        counts.whole,
        counts.exploded,
        detection.registry.chromosome_total(ChannelRole::Red),
        detection.registry.chromosome_total(ChannelRole::Green),
    );

    if let Some(out_path) = args.get(3) {
        let json = serde_json::to_string_pretty(&detection.report())?;
        std::fs::write(out_path, json)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
