//! Shared helpers for synthetic-image unit tests.

use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::segmentation::{InstanceMask, ProbabilityMask};

/// Render a filled-disk binary mask (255 inside, 0 outside).
pub(crate) fn disk_mask(w: u32, h: u32, cx: f64, cy: f64, radius: f64) -> GrayImage {
    let mut mask = GrayImage::new(w, h);
    let r_sq = radius * radius;
    for y in 0..h {
        for x in 0..w {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            if dx * dx + dy * dy <= r_sq {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }
    mask
}

/// A filled-disk oracle instance with probability 1.0 inside the disk.
pub(crate) fn disk_instance(
    w: u32,
    h: u32,
    cx: f64,
    cy: f64,
    radius: f64,
    class_id: u32,
    confidence: f32,
) -> InstanceMask {
    let binary = disk_mask(w, h, cx, cy, radius);
    let mut mask = ProbabilityMask::new(w, h);
    for (src, dst) in binary.pixels().zip(mask.pixels_mut()) {
        dst[0] = if src[0] > 0 { 1.0 } else { 0.0 };
    }
    InstanceMask {
        class_id,
        confidence,
        mask,
    }
}

/// Paint a 3x3 full-intensity dot centered at `(row, col)`.
///
/// Small and bright enough to survive unsharp masking and the binary cutoff,
/// and symmetric so its gradient-ring centroid lands exactly on the center.
pub(crate) fn paint_dot(image: &mut RgbImage, row: u32, col: u32, color: Rgb<u8>) {
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            let y = (row as i64 + dy) as u32;
            let x = (col as i64 + dx) as u32;
            image.put_pixel(x, y, color);
        }
    }
}
