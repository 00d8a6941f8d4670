//! The core pattern data type: a rectangular matrix of optional thread
//! references.

use crate::catalog::ColorId;
use crate::error::{PatternError, Result};
use serde::{Deserialize, Serialize};

/// Sentinel used for empty cells in the flat persistence mapping.
const EMPTY_CELL: i32 = -1;

/// H×W matrix of `Option<ColorId>`, row-major. Dimensions are fixed at
/// construction and always nonzero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelGrid {
    width: u32,
    height: u32,
    cells: Vec<Option<ColorId>>,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PatternError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Cell at (x, y); out-of-bounds coordinates read as empty.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<ColorId> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells[self.index(x as u32, y as u32)]
    }

    /// Write a cell. Out-of-bounds coordinates are silently ignored.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, value: Option<ColorId>) {
        if self.in_bounds(x, y) {
            let i = self.index(x as u32, y as u32);
            self.cells[i] = value;
        }
    }

    pub fn fill(&mut self, value: Option<ColorId>) {
        self.cells.fill(value);
    }

    pub fn cells(&self) -> &[Option<ColorId>] {
        &self.cells
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u32, Option<ColorId>)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| (i as u32 % width, i as u32 / width, *c))
    }

    /// Lossless flat-array mapping for the persistence boundary. Empty cells
    /// encode as -1; everything else as the catalog index.
    pub fn to_flat(&self) -> Vec<i32> {
        self.cells
            .iter()
            .map(|c| c.map_or(EMPTY_CELL, |id| id.0 as i32))
            .collect()
    }

    /// Rebuild a grid from a flat array. A malformed entry (negative other
    /// than the empty sentinel, or an id outside the catalog) is skipped and
    /// its cell left empty rather than aborting the load.
    pub fn from_flat(width: u32, height: u32, flat: &[i32], catalog_len: usize) -> Result<Self> {
        let mut grid = Self::new(width, height)?;
        let expected = width as usize * height as usize;
        if flat.len() != expected {
            return Err(PatternError::BufferSizeMismatch {
                expected,
                actual: flat.len(),
            });
        }
        let mut skipped = 0usize;
        for (i, &raw) in flat.iter().enumerate() {
            if raw == EMPTY_CELL {
                continue;
            }
            if raw < 0 || raw as usize >= catalog_len {
                skipped += 1;
                continue;
            }
            grid.cells[i] = Some(ColorId(raw as u16));
        }
        if skipped > 0 {
            log::warn!("from_flat: skipped {skipped} malformed cell entries");
        }
        Ok(grid)
    }

    /// Per-color cell counts, ordered by count descending, for material
    /// estimates and legend rendering.
    pub fn color_usage(&self) -> Vec<(ColorId, usize)> {
        let mut counts: Vec<(ColorId, usize)> = Vec::new();
        for cell in self.cells.iter().flatten() {
            match counts.iter_mut().find(|(id, _)| id == cell) {
                Some((_, n)) => *n += 1,
                None => counts.push((*cell, 1)),
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(PixelGrid::new(0, 5).is_err());
        assert!(PixelGrid::new(5, 0).is_err());
    }

    #[test]
    fn test_out_of_bounds_is_silent() {
        let mut grid = PixelGrid::new(3, 3).unwrap();
        grid.set(-1, 0, Some(ColorId(1)));
        grid.set(3, 3, Some(ColorId(1)));
        assert!(grid.is_blank());
        assert_eq!(grid.get(-2, 1), None);
        assert_eq!(grid.get(7, 7), None);
    }

    #[test]
    fn test_flat_round_trip() {
        let mut grid = PixelGrid::new(4, 2).unwrap();
        grid.set(0, 0, Some(ColorId(3)));
        grid.set(3, 1, Some(ColorId(12)));
        let flat = grid.to_flat();
        assert_eq!(flat.len(), 8);
        let restored = PixelGrid::from_flat(4, 2, &flat, 50).unwrap();
        assert_eq!(restored, grid);
    }

    #[test]
    fn test_from_flat_skips_malformed_entries() {
        // id 99 is outside a 10-entry catalog; -7 is garbage.
        let flat = vec![0, 99, -7, 2];
        let grid = PixelGrid::from_flat(2, 2, &flat, 10).unwrap();
        assert_eq!(grid.get(0, 0), Some(ColorId(0)));
        assert_eq!(grid.get(1, 0), None);
        assert_eq!(grid.get(0, 1), None);
        assert_eq!(grid.get(1, 1), Some(ColorId(2)));
    }

    #[test]
    fn test_from_flat_length_mismatch_is_structural() {
        assert!(PixelGrid::from_flat(2, 2, &[0, 1], 10).is_err());
    }

    #[test]
    fn test_color_usage_ordering() {
        let mut grid = PixelGrid::new(3, 1).unwrap();
        grid.set(0, 0, Some(ColorId(5)));
        grid.set(1, 0, Some(ColorId(5)));
        grid.set(2, 0, Some(ColorId(2)));
        assert_eq!(grid.color_usage(), vec![(ColorId(5), 2), (ColorId(2), 1)]);
    }
}
