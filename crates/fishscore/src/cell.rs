//! Detected-cell data model.
//!
//! A [`Cell`] owns its binary mask and classification, both fixed at
//! creation; the only mutation is the assigner appending chromosome points.
//! The [`CellRegistry`] is an ordered collection rebuilt from scratch for
//! every processed image, so no state leaks between images.

use image::{GrayImage, RgbImage};

use crate::candidates::{CandidatePoint, ChannelRole};
use crate::error::{Error, Result};

/// Cell classification as produced by the segmentation oracle.
///
/// The oracle's class IDs map `0 -> Exploded`, `1 -> Whole`. The mapping is
/// asymmetric with respect to display conventions and must be preserved
/// exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellClass {
    Exploded,
    Whole,
}

impl CellClass {
    /// Map an oracle class ID onto the closed class set.
    pub fn from_class_id(class_id: u32) -> Result<Self> {
        match class_id {
            0 => Ok(Self::Exploded),
            1 => Ok(Self::Whole),
            _ => Err(Error::UnknownClassId { class_id }),
        }
    }

    /// Oracle class ID of this class.
    pub fn class_id(self) -> u32 {
        match self {
            Self::Exploded => 0,
            Self::Whole => 1,
        }
    }
}

/// One detected cell: binary mask, classification, and the chromosome
/// points assigned to it.
#[derive(Debug, Clone)]
pub struct Cell {
    mask: GrayImage,
    class: CellClass,
    red_chromosomes: Vec<CandidatePoint>,
    green_chromosomes: Vec<CandidatePoint>,
}

impl Cell {
    /// Wrap a binary mask (0 = background, 255 = foreground) at source-image
    /// resolution together with its classification.
    pub fn new(mask: GrayImage, class: CellClass) -> Self {
        Self {
            mask,
            class,
            red_chromosomes: Vec::new(),
            green_chromosomes: Vec::new(),
        }
    }

    /// Binary mask at source-image resolution.
    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    pub fn class(&self) -> CellClass {
        self.class
    }

    /// Chromosome points assigned to this cell for one channel, in
    /// assignment order.
    pub fn chromosomes(&self, role: ChannelRole) -> &[CandidatePoint] {
        match role {
            ChannelRole::Red => &self.red_chromosomes,
            ChannelRole::Green => &self.green_chromosomes,
        }
    }

    pub(crate) fn push_chromosome(&mut self, role: ChannelRole, point: CandidatePoint) {
        match role {
            ChannelRole::Red => self.red_chromosomes.push(point),
            ChannelRole::Green => self.green_chromosomes.push(point),
        }
    }

    /// Masked view of a source image: pixels outside this cell's mask are
    /// black. Intended for overlay rendering by presentation code.
    pub fn masked_view(&self, image: &RgbImage) -> RgbImage {
        let (w, h) = image.dimensions();
        let mut out = RgbImage::new(w, h);
        for (x, y, p) in image.enumerate_pixels() {
            if self.mask.get_pixel(x, y)[0] > 0 {
                out.put_pixel(x, y, *p);
            }
        }
        out
    }
}

/// Per-class cell counts for an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CellCounts {
    pub exploded: usize,
    pub whole: usize,
}

/// Ordered collection of the cells detected in one image.
///
/// Insertion order is the segmentation output order; the assigner relies on
/// it as the first-match tie-break.
#[derive(Debug, Clone, Default)]
pub struct CellRegistry {
    cells: Vec<Cell>,
}

impl CellRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    /// Aggregate per-class counts, derived from the cells on demand.
    pub fn counts(&self) -> CellCounts {
        let mut counts = CellCounts::default();
        for cell in &self.cells {
            match cell.class() {
                CellClass::Exploded => counts.exploded += 1,
                CellClass::Whole => counts.whole += 1,
            }
        }
        counts
    }

    /// Total chromosome points recorded across all cells for one channel.
    ///
    /// Equals the accepted-candidate count for that channel; there is no
    /// separate running tally to drift out of sync.
    pub fn chromosome_total(&self, role: ChannelRole) -> usize {
        self.cells.iter().map(|c| c.chromosomes(role).len()).sum()
    }
}

impl<'a> IntoIterator for &'a CellRegistry {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn class_id_mapping_is_exact() {
        assert_eq!(CellClass::from_class_id(0).unwrap(), CellClass::Exploded);
        assert_eq!(CellClass::from_class_id(1).unwrap(), CellClass::Whole);
        assert_eq!(CellClass::Exploded.class_id(), 0);
        assert_eq!(CellClass::Whole.class_id(), 1);
        assert!(CellClass::from_class_id(2).is_err());
    }

    #[test]
    fn registry_counts_by_class() {
        let mut registry = CellRegistry::new();
        registry.push(Cell::new(GrayImage::new(4, 4), CellClass::Whole));
        registry.push(Cell::new(GrayImage::new(4, 4), CellClass::Exploded));
        registry.push(Cell::new(GrayImage::new(4, 4), CellClass::Whole));
        let counts = registry.counts();
        assert_eq!(counts.whole, 2);
        assert_eq!(counts.exploded, 1);
    }

    #[test]
    fn chromosome_totals_sum_per_cell_lists() {
        let mut registry = CellRegistry::new();
        registry.push(Cell::new(GrayImage::new(4, 4), CellClass::Whole));
        registry.push(Cell::new(GrayImage::new(4, 4), CellClass::Whole));
        let p = CandidatePoint { row: 1.0, col: 2.0 };
        registry.cells_mut()[0].push_chromosome(ChannelRole::Red, p);
        registry.cells_mut()[1].push_chromosome(ChannelRole::Red, p);
        registry.cells_mut()[1].push_chromosome(ChannelRole::Green, p);
        assert_eq!(registry.chromosome_total(ChannelRole::Red), 2);
        assert_eq!(registry.chromosome_total(ChannelRole::Green), 1);
    }

    #[test]
    fn masked_view_blanks_outside_pixels() {
        let mut mask = GrayImage::new(2, 2);
        mask.put_pixel(0, 0, Luma([255]));
        let cell = Cell::new(mask, CellClass::Whole);
        let image = RgbImage::from_pixel(2, 2, image::Rgb([9, 9, 9]));
        let view = cell.masked_view(&image);
        assert_eq!(*view.get_pixel(0, 0), image::Rgb([9, 9, 9]));
        assert_eq!(*view.get_pixel(1, 1), image::Rgb([0, 0, 0]));
    }
}
