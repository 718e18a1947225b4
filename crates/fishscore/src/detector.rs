//! High-level detection API.
//!
//! [`CellDetector`] is the primary entry point. It borrows a loaded
//! segmentation model and a [`DetectorConfig`]; create once, detect on many
//! images. All per-image state (registry, candidates, tallies) is created
//! and returned per call, so detectors sharing one model are independent.

use image::{imageops, DynamicImage, Rgb, RgbImage};

use crate::assign::{assign_channel, ChannelTally};
use crate::candidates::{extract_channel, find_candidates, CandidateParams, ChannelRole};
use crate::cell::{Cell, CellClass, CellCounts, CellRegistry};
use crate::error::Result;
use crate::preprocess::{flatten_alpha, unsharp_mask, UnsharpParams};
use crate::segmentation::SegmentationModel;

/// Top-level detection configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Segmentation confidence cutoff; detections below it are discarded.
    pub confidence: f32,
    /// Border-exclusion tolerance for assignment: a candidate must lie more
    /// than this many pixels inside a cell's contour.
    pub closeness: f64,
    /// Background color RGBA inputs are composited onto.
    pub background: [u8; 3],
    /// Unsharp masking parameters for the shared preprocessing step.
    pub unsharp: UnsharpParams,
    /// Per-channel candidate extraction parameters.
    pub candidates: CandidateParams,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            closeness: 1.0,
            background: [255, 255, 255],
            unsharp: UnsharpParams::default(),
            candidates: CandidateParams::default(),
        }
    }
}

/// Red/green assignment tallies for one image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChromosomeTally {
    pub red: ChannelTally,
    pub green: ChannelTally,
}

/// Primary detection interface.
pub struct CellDetector<'m> {
    model: &'m dyn SegmentationModel,
    config: DetectorConfig,
}

impl<'m> CellDetector<'m> {
    /// Create a detector with default configuration around a loaded model.
    pub fn new(model: &'m dyn SegmentationModel) -> Self {
        Self {
            model,
            config: DetectorConfig::default(),
        }
    }

    /// Create with full config control.
    pub fn with_config(model: &'m dyn SegmentationModel, config: DetectorConfig) -> Self {
        Self { model, config }
    }

    /// Access the current configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut DetectorConfig {
        &mut self.config
    }

    /// Segment `image` into a fresh cell registry.
    ///
    /// Each oracle mask is resized to the image dimensions with bilinear
    /// interpolation (fixed choice; different resize algorithms move mask
    /// boundaries and therefore containment results), then binarized as
    /// `value > 0`. Zero detections yields an empty registry, not an error.
    pub fn find_cells(&self, image: &RgbImage) -> Result<CellRegistry> {
        let instances = self.model.infer(
            image,
            &[CellClass::Exploded, CellClass::Whole],
            self.config.confidence,
        )?;

        let (w, h) = image.dimensions();
        let mut registry = CellRegistry::new();
        for instance in instances {
            let class = CellClass::from_class_id(instance.class_id)?;
            let native = &instance.mask;
            let resized = if native.dimensions() == (w, h) {
                native.clone()
            } else {
                imageops::resize(native, w, h, imageops::FilterType::Triangle)
            };
            let mut mask = image::GrayImage::new(w, h);
            for (src, dst) in resized.pixels().zip(mask.pixels_mut()) {
                dst[0] = if src[0] > 0.0 { 255 } else { 0 };
            }
            registry.push(Cell::new(mask, class));
        }

        let counts = registry.counts();
        tracing::info!(
            "{} cells found ({} whole, {} exploded)",
            registry.len(),
            counts.whole,
            counts.exploded
        );
        Ok(registry)
    }

    /// Detect red/green chromosome signals and assign them to cells.
    ///
    /// Runs the shared unsharp-masking step once, extracts candidates per
    /// channel, and assigns each candidate to at most one cell. The tallies
    /// are derived return values; summing per-cell list lengths gives the
    /// same accepted counts.
    pub fn detect_chromosomes(
        &self,
        image: &RgbImage,
        registry: &mut CellRegistry,
    ) -> ChromosomeTally {
        let sharpened = unsharp_mask(image, &self.config.unsharp);

        let red = find_candidates(
            &extract_channel(&sharpened, ChannelRole::Red),
            &self.config.candidates,
        );
        let green = find_candidates(
            &extract_channel(&sharpened, ChannelRole::Green),
            &self.config.candidates,
        );
        tracing::info!(
            "{} red / {} green chromosome candidates",
            red.len(),
            green.len()
        );

        let tally = ChromosomeTally {
            red: assign_channel(
                registry.cells_mut(),
                &red,
                ChannelRole::Red,
                self.config.closeness,
            ),
            green: assign_channel(
                registry.cells_mut(),
                &green,
                ChannelRole::Green,
                self.config.closeness,
            ),
        };
        tracing::info!(
            "assigned {} red / {} green chromosomes ({} dropped)",
            tally.red.accepted,
            tally.green.accepted,
            tally.red.dropped + tally.green.dropped
        );
        tally
    }

    /// Full pipeline on one input raster: flatten alpha, segment, extract
    /// and assign chromosomes.
    pub fn detect(&self, image: &DynamicImage) -> Result<Detection> {
        let rgb = flatten_alpha(image, Rgb(self.config.background))?;
        let mut registry = self.find_cells(&rgb)?;
        let tally = self.detect_chromosomes(&rgb, &mut registry);
        let (w, h) = rgb.dimensions();
        Ok(Detection {
            registry,
            tally,
            image_size: [w, h],
        })
    }
}

/// Everything the pipeline produced for one image.
#[derive(Debug)]
pub struct Detection {
    pub registry: CellRegistry,
    pub tally: ChromosomeTally,
    /// Image dimensions [width, height].
    pub image_size: [u32; 2],
}

impl Detection {
    /// Serializable summary for reporting and overlay rendering.
    pub fn report(&self) -> DetectionReport {
        DetectionReport {
            image_size: self.image_size,
            cell_counts: self.registry.counts(),
            red: self.tally.red,
            green: self.tally.green,
            cells: self
                .registry
                .iter()
                .map(|cell| CellReport {
                    class: cell.class(),
                    red_chromosomes: point_rows(cell.chromosomes(ChannelRole::Red)),
                    green_chromosomes: point_rows(cell.chromosomes(ChannelRole::Green)),
                })
                .collect(),
        }
    }
}

fn point_rows(points: &[crate::candidates::CandidatePoint]) -> Vec<[f64; 2]> {
    points.iter().map(|p| [p.row, p.col]).collect()
}

/// Per-image detection summary consumed by presentation code.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DetectionReport {
    /// Image dimensions [width, height].
    pub image_size: [u32; 2],
    pub cell_counts: CellCounts,
    pub red: ChannelTally,
    pub green: ChannelTally,
    /// Per-cell classifications and chromosome points `(row, col)`, in
    /// registry order.
    pub cells: Vec<CellReport>,
}

/// One cell's contribution to the report.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CellReport {
    pub class: CellClass,
    pub red_chromosomes: Vec<[f64; 2]>,
    pub green_chromosomes: Vec<[f64; 2]>,
}
