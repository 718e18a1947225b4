//! Cell-mask contour geometry.
//!
//! The assigner needs two things from a cell mask: its outer boundary as a
//! closed polygon, and the signed distance from a candidate point to that
//! polygon (positive strictly inside, negative outside, zero on the
//! boundary — `pointPolygonTest` semantics).

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use nalgebra::Point2;

/// Extract the first outer contour of a binary mask as a closed polygon in
/// `(x, y)` pixel coordinates.
///
/// Only the first outer border is used; a mask with multiple disjoint
/// regions is represented by one arbitrary region's boundary. This mirrors
/// the reference behavior and is a known scope limitation for pathological
/// segmentations.
///
/// Returns `None` when the mask has no foreground or the traced boundary is
/// degenerate (fewer than 3 points); callers treat that as a per-cell
/// extraction failure.
pub fn outer_contour(mask: &GrayImage) -> Option<Vec<Point2<f64>>> {
    let contours = find_contours::<i32>(mask);
    let outer = contours
        .into_iter()
        .find(|c| c.border_type == BorderType::Outer)?;
    if outer.points.len() < 3 {
        return None;
    }
    Some(
        outer
            .points
            .iter()
            .map(|p| Point2::new(p.x as f64, p.y as f64))
            .collect(),
    )
}

/// Signed distance from `point` to the closed polygon `contour`.
///
/// Magnitude is the minimum distance to any polygon segment; the sign is
/// positive when the point lies strictly inside, negative outside, and the
/// result is exactly `0.0` on the boundary.
pub fn signed_distance(contour: &[Point2<f64>], point: Point2<f64>) -> f64 {
    debug_assert!(contour.len() >= 3, "contour must be a polygon");

    let mut min_dist = f64::INFINITY;
    for i in 0..contour.len() {
        let a = contour[i];
        let b = contour[(i + 1) % contour.len()];
        min_dist = min_dist.min(point_segment_distance(point, a, b));
    }
    if min_dist == 0.0 {
        return 0.0;
    }
    if point_in_polygon(contour, point) {
        min_dist
    } else {
        -min_dist
    }
}

/// Distance from `p` to the segment `a`-`b`.
fn point_segment_distance(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    let ab = b - a;
    let ap = p - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return ap.norm();
    }
    let t = (ap.dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Even-odd ray-casting containment test.
///
/// Only called for points that are strictly off the boundary, so the
/// half-open vertex rule is sufficient.
fn point_in_polygon(contour: &[Point2<f64>], p: Point2<f64>) -> bool {
    let mut inside = false;
    let n = contour.len();
    let mut j = n - 1;
    for i in 0..n {
        let pi = contour[i];
        let pj = contour[j];
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = pj.x + (p.y - pj.y) / (pi.y - pj.y) * (pi.x - pj.x);
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
