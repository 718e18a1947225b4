//! fishscore — cell segmentation scoring and FISH chromosome-signal
//! counting for cytogenetic microscope images.
//!
//! Given an RGB(A) image of a chromosome preparation and a loaded
//! instance-segmentation model, the pipeline counts whole vs exploded cells
//! and tallies red/green fluorescent chromosome signals per cell:
//!
//! 1. **Preprocess** – RGBA flattening, unsharp masking of the full image.
//! 2. **Segment** – oracle instance masks, resized (bilinear) and binarized
//!    into a per-image cell registry.
//! 3. **Extract** – per color channel: fixed-cutoff threshold →
//!    morphological gradient → 4-connected components → centroids.
//! 4. **Assign** – each candidate goes to the first cell (registry order)
//!    that contains it by more than the closeness threshold.
//!
//! # Public API
//! - [`CellDetector`] and [`DetectorConfig`] as primary entry points
//! - [`SegmentationModel`] as the inference seam; [`PrecomputedMasks`] as a
//!   file-backed implementation
//! - [`Detection`] / [`DetectionReport`] for reporting and overlays

mod assign;
mod candidates;
mod cell;
mod contour;
mod detector;
mod error;
mod preprocess;
mod segmentation;
#[cfg(test)]
pub(crate) mod test_utils;

pub use assign::{assign_channel, ChannelTally};
pub use candidates::{
    extract_channel, find_candidates, CandidateParams, CandidatePoint, ChannelRole,
};
pub use cell::{Cell, CellClass, CellCounts, CellRegistry};
pub use contour::{outer_contour, signed_distance};
pub use detector::{
    CellDetector, CellReport, ChromosomeTally, Detection, DetectionReport, DetectorConfig,
};
pub use error::{Error, Result};
pub use preprocess::{flatten_alpha, unsharp_mask, UnsharpParams};
pub use segmentation::{InstanceMask, PrecomputedMasks, ProbabilityMask, SegmentationModel};
