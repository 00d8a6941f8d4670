//! Serpentine Floyd–Steinberg error diffusion over a sampled cell grid.
//!
//! Rows are traversed top to bottom, alternating direction by row parity,
//! which breaks up the diagonal worm artifacts of a fixed left-to-right scan.
//! Error never diffuses into empty (fabric) cells and empty cells never
//! become stitches.

use crate::catalog::{ColorId, ThreadCatalog};
use crate::color::{delta_e, rgb_to_lab};
use crate::error::{PatternError, Result};
use crate::grid::PixelGrid;

/// Floyd–Steinberg kernel: 7/16 forward, then 3/16, 5/16, 1/16 on the next
/// row, mirrored on right-to-left rows.
const KERNEL: [(i32, i32, f32); 4] = [
    (1, 0, 7.0 / 16.0),
    (-1, 1, 3.0 / 16.0),
    (0, 1, 5.0 / 16.0),
    (1, 1, 1.0 / 16.0),
];

/// Map sampled cell colors onto the used palette with error diffusion.
///
/// `strength` in [0, 1] scales every diffused fraction; 0 degenerates to
/// plain nearest-color mapping.
pub fn dither_to_grid(
    samples: &[Option<[u8; 3]>],
    width: u32,
    height: u32,
    catalog: &ThreadCatalog,
    used: &[ColorId],
    strength: f32,
) -> Result<PixelGrid> {
    let mut grid = PixelGrid::new(width, height)?;
    let expected = width as usize * height as usize;
    if samples.len() != expected {
        return Err(PatternError::BufferSizeMismatch {
            expected,
            actual: samples.len(),
        });
    }
    if used.is_empty() {
        return Err(PatternError::EmptyPalette);
    }
    let strength = strength.clamp(0.0, 1.0);

    let entries: Vec<(ColorId, [f32; 3])> = used
        .iter()
        .filter_map(|id| catalog.entry(*id).map(|e| (*id, e.rgb)))
        .map(|(id, rgb)| (id, [rgb[0] as f32, rgb[1] as f32, rgb[2] as f32]))
        .collect();
    if entries.is_empty() {
        return Err(PatternError::EmptyPalette);
    }

    let w = width as i32;
    let h = height as i32;
    let mut error = vec![[0.0f32; 3]; samples.len()];

    for y in 0..h {
        let reversed = y % 2 == 1;
        for step in 0..w {
            let x = if reversed { w - 1 - step } else { step };
            let i = (y * w + x) as usize;
            let Some(sample) = samples[i] else {
                continue;
            };

            let adjusted = [
                (sample[0] as f32 + error[i][0]).clamp(0.0, 255.0),
                (sample[1] as f32 + error[i][1]).clamp(0.0, 255.0),
                (sample[2] as f32 + error[i][2]).clamp(0.0, 255.0),
            ];
            let (chosen_id, chosen_rgb) = nearest_entry(&entries, adjusted);
            grid.set(x, y, Some(chosen_id));

            let residual = [
                adjusted[0] - chosen_rgb[0],
                adjusted[1] - chosen_rgb[1],
                adjusted[2] - chosen_rgb[2],
            ];
            let dir = if reversed { -1 } else { 1 };
            for (dx, dy, fraction) in KERNEL {
                let nx = x + dx * dir;
                let ny = y + dy;
                if nx < 0 || nx >= w || ny < 0 || ny >= h {
                    continue;
                }
                let ni = (ny * w + nx) as usize;
                if samples[ni].is_none() {
                    continue;
                }
                let scale = fraction * strength;
                for c in 0..3 {
                    error[ni][c] += residual[c] * scale;
                }
            }
        }
    }

    Ok(grid)
}

fn nearest_entry(entries: &[(ColorId, [f32; 3])], rgb: [f32; 3]) -> (ColorId, [f32; 3]) {
    let query = rgb_to_lab([
        rgb[0].round() as u8,
        rgb[1].round() as u8,
        rgb[2].round() as u8,
    ]);
    let mut best = entries[0];
    let mut best_d = f32::MAX;
    for entry in entries {
        let lab = rgb_to_lab([
            entry.1[0] as u8,
            entry.1[1] as u8,
            entry.1[2] as u8,
        ]);
        let d = delta_e(query, lab);
        if d < best_d {
            best_d = d;
            best = *entry;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_white_catalog() -> ThreadCatalog {
        ThreadCatalog::new(vec![("W", "White", 0xFFFFFFu32), ("B", "Black", 0x000000)])
    }

    #[test]
    fn test_empty_cells_stay_empty() {
        let catalog = black_white_catalog();
        let used = [ColorId(0), ColorId(1)];
        let samples = vec![Some([128, 128, 128]), None, None, Some([128, 128, 128])];
        let grid = dither_to_grid(&samples, 2, 2, &catalog, &used, 1.0).unwrap();
        assert_eq!(grid.get(1, 0), None);
        assert_eq!(grid.get(0, 1), None);
        assert!(grid.get(0, 0).is_some());
        assert!(grid.get(1, 1).is_some());
    }

    #[test]
    fn test_uniform_region_preserves_mean() {
        let catalog = black_white_catalog();
        let used = [ColorId(0), ColorId(1)];
        let (w, h) = (32u32, 32u32);
        let samples = vec![Some([100u8, 100, 100]); (w * h) as usize];
        let grid = dither_to_grid(&samples, w, h, &catalog, &used, 1.0).unwrap();

        let white_cells = grid
            .cells()
            .iter()
            .filter(|c| **c == Some(ColorId(0)))
            .count();
        let mean = white_cells as f32 * 255.0 / (w * h) as f32;
        // Lab-nearest mapping of mid-gray is not linear in RGB, so allow a
        // generous band around the input level; the point is that diffusion
        // produces a mix, not a constant field.
        assert!(
            (60.0..170.0).contains(&mean),
            "mean {mean} drifted too far from source level 100"
        );
        assert!(white_cells > 0 && white_cells < (w * h) as usize);
    }

    #[test]
    fn test_zero_strength_is_plain_mapping() {
        let catalog = black_white_catalog();
        let used = [ColorId(0), ColorId(1)];
        let samples = vec![Some([10u8, 10, 10]); 16];
        let grid = dither_to_grid(&samples, 4, 4, &catalog, &used, 0.0).unwrap();
        assert!(grid.cells().iter().all(|c| *c == Some(ColorId(1))));
    }

    #[test]
    fn test_empty_palette_is_error() {
        let catalog = black_white_catalog();
        let samples = vec![Some([1u8, 2, 3])];
        assert!(dither_to_grid(&samples, 1, 1, &catalog, &[], 1.0).is_err());
    }
}
