//! Error types for the detection pipeline.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the detection pipeline.
///
/// All failures are fatal for the image being processed; there is no retry
/// policy. An oracle returning zero detections or a channel yielding zero
/// candidates is *not* an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input raster is neither 3-channel RGB nor 4-channel RGBA.
    #[error("expected a 3-channel (RGB) or 4-channel (RGBA) image, got {found} channels")]
    UnsupportedChannelCount { found: u8 },

    /// Segmentation oracle returned a class ID outside the recognized set.
    #[error("unrecognized segmentation class id {class_id} (expected 0 = exploded, 1 = whole)")]
    UnknownClassId { class_id: u32 },

    /// Segmentation oracle failed to produce a prediction.
    #[error("segmentation inference failed: {0}")]
    Inference(String),

    /// Mask file does not match the expected schema.
    #[error("invalid mask file: {0}")]
    Schema(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
