//! Segmentation oracle interface.
//!
//! The instance-segmentation model is an external collaborator: expensive
//! to load, stateless after loading, shared read-only across detectors.
//! This module defines the seam ([`SegmentationModel`]) plus a JSON-backed
//! implementation ([`PrecomputedMasks`]) so the CLI and tests can run
//! without an inference runtime in the loop.

use std::path::Path;

use image::{ImageBuffer, Luma};

use crate::cell::CellClass;
use crate::error::{Error, Result};

/// Probability mask type at the oracle's native resolution.
pub type ProbabilityMask = ImageBuffer<Luma<f32>, Vec<f32>>;

/// One instance prediction: a probability mask at the oracle's native
/// resolution plus its class ID and confidence.
#[derive(Debug, Clone)]
pub struct InstanceMask {
    pub class_id: u32,
    pub confidence: f32,
    pub mask: ProbabilityMask,
}

/// Instance-segmentation oracle.
///
/// Implementations must be stateless per call (`&self` inference) and
/// shareable across threads, so several detectors can run read-only
/// inference against one loaded model.
pub trait SegmentationModel: Send + Sync {
    /// Predict instance masks for `image`.
    ///
    /// Only instances whose class is in `classes` and whose confidence is at
    /// least `confidence` are returned, in the oracle's output order. Zero
    /// detections is valid output, not an error.
    fn infer(
        &self,
        image: &image::RgbImage,
        classes: &[CellClass],
        confidence: f32,
    ) -> Result<Vec<InstanceMask>>;
}

const MASK_SCHEMA_V1: &str = "fishscore.masks.v1";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct MaskFileV1 {
    schema: String,
    instances: Vec<MaskInstanceV1>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct MaskInstanceV1 {
    class_id: u32,
    confidence: f32,
    width: u32,
    height: u32,
    /// Row-major probabilities, `width * height` values.
    data: Vec<f32>,
}

/// Oracle backed by a file of precomputed instance masks.
///
/// The file follows the `fishscore.masks.v1` schema and is typically
/// exported by the upstream inference job. Masks may be at a resolution
/// different from the image they were predicted on; the registry builder
/// resizes them.
#[derive(Debug, Clone)]
pub struct PrecomputedMasks {
    instances: Vec<InstanceMask>,
}

impl PrecomputedMasks {
    /// Load from a `fishscore.masks.v1` JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let file: MaskFileV1 = serde_json::from_str(&data)?;
        Self::from_mask_file(file)
    }

    /// Wrap already-decoded instances.
    pub fn from_instances(instances: Vec<InstanceMask>) -> Self {
        Self { instances }
    }

    fn from_mask_file(file: MaskFileV1) -> Result<Self> {
        if file.schema != MASK_SCHEMA_V1 {
            return Err(Error::Schema(format!(
                "unsupported mask schema '{}' (expected '{}')",
                file.schema, MASK_SCHEMA_V1
            )));
        }

        let mut instances = Vec::with_capacity(file.instances.len());
        for (idx, inst) in file.instances.into_iter().enumerate() {
            let expected = (inst.width as usize) * (inst.height as usize);
            if inst.data.len() != expected {
                return Err(Error::Schema(format!(
                    "instance {idx}: {}x{} mask needs {expected} values, got {}",
                    inst.width,
                    inst.height,
                    inst.data.len()
                )));
            }
            let mask = ProbabilityMask::from_raw(inst.width, inst.height, inst.data)
                .ok_or_else(|| Error::Schema(format!("instance {idx}: empty mask")))?;
            instances.push(InstanceMask {
                class_id: inst.class_id,
                confidence: inst.confidence,
                mask,
            });
        }
        Ok(Self { instances })
    }

    /// All stored instances, unfiltered.
    pub fn instances(&self) -> &[InstanceMask] {
        &self.instances
    }
}

impl SegmentationModel for PrecomputedMasks {
    fn infer(
        &self,
        _image: &image::RgbImage,
        classes: &[CellClass],
        confidence: f32,
    ) -> Result<Vec<InstanceMask>> {
        Ok(self
            .instances
            .iter()
            .filter(|inst| {
                inst.confidence >= confidence
                    && classes.iter().any(|c| c.class_id() == inst.class_id)
            })
            .cloned()
            .collect())
    }
}
