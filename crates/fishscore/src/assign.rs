//! Candidate-to-cell assignment.
//!
//! Each channel's candidates are scanned in extractor output order; for each
//! candidate the cells are scanned in registry order and the first cell that
//! strictly contains the point — by more than the closeness threshold — wins
//! it. A point therefore lands in at most one cell's list per channel, and
//! registry order is the tie-break if cell masks ever overlap.

use nalgebra::Point2;

use crate::candidates::{CandidatePoint, ChannelRole};
use crate::cell::Cell;
use crate::contour::{outer_contour, signed_distance};

/// Outcome of one channel's assignment pass.
///
/// These are plain return values: the reference kept process-wide running
/// counters, which are redundant with the per-cell lists and unsafe under
/// concurrent detectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChannelTally {
    /// Candidates accepted into some cell's chromosome list.
    pub accepted: usize,
    /// Candidates inside no cell (or too close to every border), dropped.
    pub dropped: usize,
}

/// Assign one channel's candidates to cells.
///
/// A candidate is eligible for a cell iff its signed distance to the cell's
/// outer contour is `> 0` (strictly inside) *and* `> closeness` (not within
/// `closeness` of the boundary). Candidates accepted nowhere are dropped
/// silently but counted in the tally. Cells whose contour cannot be
/// extracted are skipped with a warning rather than failing the image.
pub fn assign_channel(
    cells: &mut [Cell],
    candidates: &[CandidatePoint],
    role: ChannelRole,
    closeness: f64,
) -> ChannelTally {
    // Contours depend only on the immutable masks; trace each once up front.
    let contours: Vec<_> = cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let contour = outer_contour(cell.mask());
            if contour.is_none() {
                tracing::warn!(
                    cell = idx,
                    "contour extraction failed for cell mask; cell excluded from {role} assignment"
                );
            }
            contour
        })
        .collect();

    let mut accepted = vec![false; candidates.len()];
    for (idx, candidate) in candidates.iter().enumerate() {
        for (cell, contour) in cells.iter_mut().zip(&contours) {
            let Some(contour) = contour else {
                continue;
            };
            // Geometry runs in (x, y) = (col, row); the data model is (row, col).
            let distance = signed_distance(contour, Point2::new(candidate.col, candidate.row));
            let inside_cell = distance > 0.0;
            let almost_on_border = distance <= closeness;

            if !accepted[idx] && inside_cell && !almost_on_border {
                accepted[idx] = true;
                cell.push_chromosome(role, *candidate);
                break;
            }
        }
    }

    let n_accepted = accepted.iter().filter(|&&a| a).count();
    let tally = ChannelTally {
        accepted: n_accepted,
        dropped: candidates.len() - n_accepted,
    };
    tracing::debug!(
        "{role} channel: {} of {} candidates assigned",
        tally.accepted,
        candidates.len()
    );
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellClass;
    use crate::test_utils::disk_mask;
    use image::GrayImage;

    fn disk_cell(cx: f64, cy: f64, r: f64) -> Cell {
        Cell::new(disk_mask(100, 100, cx, cy, r), CellClass::Whole)
    }

    fn point(row: f64, col: f64) -> CandidatePoint {
        CandidatePoint { row, col }
    }

    #[test]
    fn center_point_is_accepted() {
        let mut cells = vec![disk_cell(30.0, 30.0, 20.0)];
        let tally = assign_channel(&mut cells, &[point(30.0, 30.0)], ChannelRole::Red, 1.0);
        assert_eq!(tally, ChannelTally { accepted: 1, dropped: 0 });
        assert_eq!(cells[0].chromosomes(ChannelRole::Red).len(), 1);
    }

    #[test]
    fn outside_point_is_dropped() {
        let mut cells = vec![disk_cell(30.0, 30.0, 20.0)];
        let tally = assign_channel(&mut cells, &[point(90.0, 90.0)], ChannelRole::Red, 1.0);
        assert_eq!(tally, ChannelTally { accepted: 0, dropped: 1 });
        assert!(cells[0].chromosomes(ChannelRole::Red).is_empty());
    }

    #[test]
    fn near_border_point_is_rejected_by_closeness() {
        let mut cells = vec![disk_cell(30.0, 30.0, 20.0)];
        // ~0.5 px inside the rasterized boundary: inside, but within the
        // closeness band.
        let tally = assign_channel(&mut cells, &[point(30.0, 49.5)], ChannelRole::Red, 1.0);
        assert_eq!(tally.accepted, 0);
        assert_eq!(tally.dropped, 1);
    }

    #[test]
    fn boundary_point_is_never_accepted_even_with_zero_closeness() {
        let mut cells = vec![disk_cell(30.0, 30.0, 20.0)];
        // (row 30, col 50) is exactly on the traced contour of the disk.
        let tally = assign_channel(&mut cells, &[point(30.0, 50.0)], ChannelRole::Red, 0.0);
        assert_eq!(tally.accepted, 0);
    }

    #[test]
    fn first_cell_in_registry_order_wins_overlap() {
        // Two identical overlapping disks; the point is inside both.
        let mut cells = vec![disk_cell(50.0, 50.0, 20.0), disk_cell(50.0, 50.0, 20.0)];
        let tally = assign_channel(&mut cells, &[point(50.0, 50.0)], ChannelRole::Green, 1.0);
        assert_eq!(tally.accepted, 1);
        assert_eq!(cells[0].chromosomes(ChannelRole::Green).len(), 1);
        assert!(cells[1].chromosomes(ChannelRole::Green).is_empty());
    }

    #[test]
    fn partition_property_holds() {
        let mut cells = vec![disk_cell(30.0, 30.0, 20.0), disk_cell(70.0, 70.0, 20.0)];
        let candidates = [
            point(30.0, 30.0), // cell 0
            point(70.0, 70.0), // cell 1
            point(65.0, 75.0), // cell 1
            point(5.0, 95.0),  // nowhere
        ];
        let tally = assign_channel(&mut cells, &candidates, ChannelRole::Red, 1.0);
        let listed: usize = cells
            .iter()
            .map(|c| c.chromosomes(ChannelRole::Red).len())
            .sum();
        assert_eq!(listed, tally.accepted);
        assert_eq!(tally.accepted, 3);
        assert_eq!(tally.dropped, 1);
    }

    #[test]
    fn degenerate_mask_cell_is_skipped_not_fatal() {
        // First cell has an empty mask (contour extraction fails); the
        // second still receives its point.
        let mut cells = vec![
            Cell::new(GrayImage::new(100, 100), CellClass::Exploded),
            disk_cell(50.0, 50.0, 20.0),
        ];
        let tally = assign_channel(&mut cells, &[point(50.0, 50.0)], ChannelRole::Red, 1.0);
        assert_eq!(tally.accepted, 1);
        assert!(cells[0].chromosomes(ChannelRole::Red).is_empty());
        assert_eq!(cells[1].chromosomes(ChannelRole::Red).len(), 1);
    }

    #[test]
    fn empty_candidate_set_is_valid() {
        let mut cells = vec![disk_cell(30.0, 30.0, 20.0)];
        let tally = assign_channel(&mut cells, &[], ChannelRole::Green, 1.0);
        assert_eq!(tally, ChannelTally::default());
    }
}
