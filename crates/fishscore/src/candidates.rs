//! Per-channel chromosome candidate extraction.
//!
//! A channel of the sharpened image is binarized at a fixed cutoff, the
//! blob boundaries are highlighted with a morphological gradient (dilation
//! minus erosion, 3x3 rectangular structuring element), and the centroid of
//! every 4-connected component of the gradient map becomes one candidate.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};
use imageproc::region_labelling::{connected_components, Connectivity};

/// Color channel a candidate set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRole {
    Red,
    Green,
}

impl ChannelRole {
    /// Index of this channel in an RGB pixel.
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
        }
    }
}

impl std::fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Red => write!(f, "red"),
            Self::Green => write!(f, "green"),
        }
    }
}

/// A candidate chromosome location: one connected component's centroid, in
/// image `(row, col)` coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CandidatePoint {
    pub row: f64,
    pub col: f64,
}

/// Candidate extraction parameters.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CandidateParams {
    /// Binary threshold applied to the channel: values strictly above the
    /// cutoff become foreground.
    pub signal_cutoff: u8,
}

impl Default for CandidateParams {
    fn default() -> Self {
        Self { signal_cutoff: 100 }
    }
}

/// Extract one color channel of an RGB image as a grayscale plane.
pub fn extract_channel(image: &image::RgbImage, role: ChannelRole) -> GrayImage {
    let (w, h) = image.dimensions();
    let mut out = GrayImage::new(w, h);
    let c = role.index();
    for (src, dst) in image.pixels().zip(out.pixels_mut()) {
        dst[0] = src[c];
    }
    out
}

/// Find candidate chromosome centroids in a single channel.
///
/// Candidates are returned in ascending component-label order. That order is
/// reproducible for identical inputs but is otherwise an implementation
/// artifact; callers must not attach meaning to it. An image with no signal
/// above the cutoff yields an empty set.
pub fn find_candidates(channel: &GrayImage, params: &CandidateParams) -> Vec<CandidatePoint> {
    let binary = binary_threshold(channel, params.signal_cutoff);
    let gradient = morphological_gradient(&binary);
    let labels = connected_components(&gradient, Connectivity::Four, Luma([0u8]));
    candidate_centroids(&labels)
}

/// Binary threshold: 255 where `value > cutoff`, 0 elsewhere.
fn binary_threshold(image: &GrayImage, cutoff: u8) -> GrayImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        p[0] = if p[0] > cutoff { 255 } else { 0 };
    }
    out
}

/// Morphological gradient with a 3x3 rectangular structuring element.
///
/// `Norm::LInf` with radius 1 is exactly the 3x3 box.
fn morphological_gradient(binary: &GrayImage) -> GrayImage {
    let dilated = dilate(binary, Norm::LInf, 1);
    let eroded = erode(binary, Norm::LInf, 1);
    let mut out = dilated;
    for (p, e) in out.pixels_mut().zip(eroded.pixels()) {
        p[0] = p[0].saturating_sub(e[0]);
    }
    out
}

/// Centroid of every labeled component, label order, background (0) skipped.
///
/// The reference computes a center of mass weighted by the label map's own
/// values; weights are constant within a component, so this reduces to the
/// arithmetic mean of the member pixel coordinates. A single-pixel component
/// yields that pixel's coordinates.
fn candidate_centroids(
    labels: &image::ImageBuffer<Luma<u32>, Vec<u32>>,
) -> Vec<CandidatePoint> {
    let max_label = labels.pixels().map(|p| p[0]).max().unwrap_or(0) as usize;
    if max_label == 0 {
        return Vec::new();
    }

    // (sum_row, sum_col, count) per label, index 0 unused.
    let mut acc = vec![(0.0f64, 0.0f64, 0usize); max_label + 1];
    for (x, y, p) in labels.enumerate_pixels() {
        let label = p[0] as usize;
        if label == 0 {
            continue;
        }
        let slot = &mut acc[label];
        slot.0 += y as f64;
        slot.1 += x as f64;
        slot.2 += 1;
    }

    acc.iter()
        .skip(1)
        .filter(|(_, _, n)| *n > 0)
        .map(|&(sum_row, sum_col, n)| CandidatePoint {
            row: sum_row / n as f64,
            col: sum_col / n as f64,
        })
        .collect()
}
