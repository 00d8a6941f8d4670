//! Drawing primitives over a pixel grid: flood fill, strokes, rectangles,
//! mirror and rotate.

use crate::catalog::ColorId;
use crate::grid::PixelGrid;
use crate::selection::SelectionBounds;

/// Stack-based 4-connected region fill. Filling with the region's existing
/// color is a no-op.
pub fn flood_fill(grid: &mut PixelGrid, x: i32, y: i32, color: Option<ColorId>) {
    if !grid.in_bounds(x, y) {
        return;
    }
    let target = grid.get(x, y);
    if target == color {
        return;
    }
    let mut stack = vec![(x, y)];
    while let Some((cx, cy)) = stack.pop() {
        if !grid.in_bounds(cx, cy) || grid.get(cx, cy) != target {
            continue;
        }
        grid.set(cx, cy, color);
        stack.push((cx - 1, cy));
        stack.push((cx + 1, cy));
        stack.push((cx, cy - 1));
        stack.push((cx, cy + 1));
    }
}

/// Bresenham cell walk from `(x0, y0)` to `(x1, y1)`, inclusive.
pub fn line_cells(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<(i32, i32)> {
    let mut cells = Vec::new();
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    loop {
        cells.push((x, y));
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    cells
}

pub fn draw_line(grid: &mut PixelGrid, from: (i32, i32), to: (i32, i32), color: Option<ColorId>) {
    for (x, y) in line_cells(from.0, from.1, to.0, to.1) {
        grid.set(x, y, color);
    }
}

/// Brush stroke: a square stamp of radius `size / 2` at every Bresenham cell
/// between the two points, so fast pointer motion still leaves a continuous
/// thick stroke.
pub fn draw_brush(
    grid: &mut PixelGrid,
    from: (i32, i32),
    to: (i32, i32),
    color: Option<ColorId>,
    size: u32,
) {
    let radius = (size / 2) as i32;
    for (x, y) in line_cells(from.0, from.1, to.0, to.1) {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                grid.set(x + dx, y + dy, color);
            }
        }
    }
}

/// Filled or outlined rectangle between two arbitrary corners.
pub fn draw_rect(
    grid: &mut PixelGrid,
    corner_a: (i32, i32),
    corner_b: (i32, i32),
    color: Option<ColorId>,
    filled: bool,
) {
    let min_x = corner_a.0.min(corner_b.0);
    let max_x = corner_a.0.max(corner_b.0);
    let min_y = corner_a.1.min(corner_b.1);
    let max_y = corner_a.1.max(corner_b.1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if filled || x == min_x || x == max_x || y == min_y || y == max_y {
                grid.set(x, y, color);
            }
        }
    }
}

fn whole_grid(grid: &PixelGrid) -> SelectionBounds {
    SelectionBounds {
        min_x: 0,
        min_y: 0,
        max_x: grid.width() - 1,
        max_y: grid.height() - 1,
    }
}

/// Mirror the region left-right. `None` mirrors the whole grid.
pub fn mirror_horizontal(grid: &mut PixelGrid, region: Option<SelectionBounds>) {
    let b = region.unwrap_or_else(|| whole_grid(grid));
    let w = b.width() as i32;
    for y in b.min_y..=b.max_y {
        for offset in 0..w / 2 {
            let left = (b.min_x as i32 + offset, y as i32);
            let right = (b.max_x as i32 - offset, y as i32);
            let tmp = grid.get(left.0, left.1);
            grid.set(left.0, left.1, grid.get(right.0, right.1));
            grid.set(right.0, right.1, tmp);
        }
    }
}

/// Mirror the region top-bottom. `None` mirrors the whole grid.
pub fn mirror_vertical(grid: &mut PixelGrid, region: Option<SelectionBounds>) {
    let b = region.unwrap_or_else(|| whole_grid(grid));
    let h = b.height() as i32;
    for x in b.min_x..=b.max_x {
        for offset in 0..h / 2 {
            let top = (x as i32, b.min_y as i32 + offset);
            let bottom = (x as i32, b.max_y as i32 - offset);
            let tmp = grid.get(top.0, top.1);
            grid.set(top.0, top.1, grid.get(bottom.0, bottom.1));
            grid.set(bottom.0, bottom.1, tmp);
        }
    }
}

/// Rotate the region 90 degrees clockwise. The rotated box is re-centered on
/// the original region's centroid; cells that fall outside the grid are
/// dropped. `None` rotates the whole grid in place around its center.
pub fn rotate_90(grid: &mut PixelGrid, region: Option<SelectionBounds>) {
    let b = region.unwrap_or_else(|| whole_grid(grid));
    let bw = b.width() as i32;
    let bh = b.height() as i32;

    let mut extracted = vec![None; (bw * bh) as usize];
    for y in 0..bh {
        for x in 0..bw {
            extracted[(y * bw + x) as usize] = grid.get(b.min_x as i32 + x, b.min_y as i32 + y);
            grid.set(b.min_x as i32 + x, b.min_y as i32 + y, None);
        }
    }

    // Clockwise: source (x, y) lands at (bh - 1 - y, x) in a bh-wide box.
    let (rw, rh) = (bh, bw);
    let center_x = b.min_x as f32 + (bw as f32 - 1.0) / 2.0;
    let center_y = b.min_y as f32 + (bh as f32 - 1.0) / 2.0;
    let origin_x = (center_x - (rw as f32 - 1.0) / 2.0).round() as i32;
    let origin_y = (center_y - (rh as f32 - 1.0) / 2.0).round() as i32;

    for y in 0..bh {
        for x in 0..bw {
            let cell = extracted[(y * bw + x) as usize];
            if cell.is_some() {
                grid.set(origin_x + (bh - 1 - y), origin_y + x, cell);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flood_fill_empty_grid() {
        let mut grid = PixelGrid::new(4, 4).unwrap();
        flood_fill(&mut grid, 0, 0, Some(ColorId(1)));
        assert!(grid
            .cells()
            .iter()
            .all(|c| *c == Some(ColorId(1))));
    }

    #[test]
    fn test_flood_fill_respects_boundaries() {
        let mut grid = PixelGrid::new(5, 5).unwrap();
        // Vertical wall at x = 2.
        for y in 0..5 {
            grid.set(2, y, Some(ColorId(9)));
        }
        flood_fill(&mut grid, 0, 0, Some(ColorId(1)));
        assert_eq!(grid.get(1, 4), Some(ColorId(1)));
        assert_eq!(grid.get(2, 2), Some(ColorId(9)));
        assert_eq!(grid.get(3, 0), None);
    }

    #[test]
    fn test_flood_fill_same_color_is_noop() {
        let mut grid = PixelGrid::new(3, 3).unwrap();
        grid.fill(Some(ColorId(4)));
        let before = grid.clone();
        flood_fill(&mut grid, 1, 1, Some(ColorId(4)));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_line_cells_endpoints_and_connectivity() {
        let cells = line_cells(0, 0, 4, 2);
        assert_eq!(cells.first(), Some(&(0, 0)));
        assert_eq!(cells.last(), Some(&(4, 2)));
        for pair in cells.windows(2) {
            let (dx, dy) = (pair[1].0 - pair[0].0, pair[1].1 - pair[0].1);
            assert!(dx.abs() <= 1 && dy.abs() <= 1);
        }
    }

    #[test]
    fn test_brush_stamps_thick_stroke() {
        let mut grid = PixelGrid::new(7, 7).unwrap();
        draw_brush(&mut grid, (1, 3), (5, 3), Some(ColorId(2)), 3);
        // Radius 1 stamp covers the row above and below the stroke.
        for x in 1..=5 {
            assert_eq!(grid.get(x, 2), Some(ColorId(2)));
            assert_eq!(grid.get(x, 3), Some(ColorId(2)));
            assert_eq!(grid.get(x, 4), Some(ColorId(2)));
        }
        assert_eq!(grid.get(3, 5), None);
    }

    #[test]
    fn test_rect_outline_vs_filled() {
        let mut outline = PixelGrid::new(6, 6).unwrap();
        draw_rect(&mut outline, (4, 4), (1, 1), Some(ColorId(1)), false);
        assert_eq!(outline.get(1, 1), Some(ColorId(1)));
        assert_eq!(outline.get(4, 1), Some(ColorId(1)));
        assert_eq!(outline.get(2, 2), None);

        let mut filled = PixelGrid::new(6, 6).unwrap();
        draw_rect(&mut filled, (4, 4), (1, 1), Some(ColorId(1)), true);
        assert_eq!(filled.get(2, 2), Some(ColorId(1)));
    }

    #[test]
    fn test_mirror_horizontal_whole_grid() {
        let mut grid = PixelGrid::new(4, 2).unwrap();
        grid.set(0, 0, Some(ColorId(1)));
        mirror_horizontal(&mut grid, None);
        assert_eq!(grid.get(0, 0), None);
        assert_eq!(grid.get(3, 0), Some(ColorId(1)));
    }

    #[test]
    fn test_mirror_vertical_within_region() {
        let mut grid = PixelGrid::new(4, 4).unwrap();
        grid.set(1, 1, Some(ColorId(1)));
        grid.set(0, 0, Some(ColorId(9)));
        let region = SelectionBounds {
            min_x: 1,
            min_y: 1,
            max_x: 2,
            max_y: 2,
        };
        mirror_vertical(&mut grid, Some(region));
        assert_eq!(grid.get(1, 2), Some(ColorId(1)));
        assert_eq!(grid.get(1, 1), None);
        // Outside the region is untouched.
        assert_eq!(grid.get(0, 0), Some(ColorId(9)));
    }

    #[test]
    fn test_rotate_square_region() {
        let mut grid = PixelGrid::new(4, 4).unwrap();
        grid.set(0, 0, Some(ColorId(1)));
        rotate_90(&mut grid, None);
        assert_eq!(grid.get(3, 0), Some(ColorId(1)));
        assert_eq!(grid.get(0, 0), None);
    }

    #[test]
    fn test_rotate_rectangular_region_recenters() {
        let mut grid = PixelGrid::new(7, 7).unwrap();
        // 3x1 horizontal bar at y = 3, x = 2..=4.
        for x in 2..=4 {
            grid.set(x, 3, Some(ColorId(5)));
        }
        let region = SelectionBounds {
            min_x: 2,
            min_y: 3,
            max_x: 4,
            max_y: 3,
        };
        rotate_90(&mut grid, Some(region));
        // The bar becomes vertical, centered on the same cell (3, 3).
        for y in 2..=4 {
            assert_eq!(grid.get(3, y), Some(ColorId(5)), "y = {y}");
        }
        assert_eq!(grid.get(2, 3), None);
        assert_eq!(grid.get(4, 3), None);
    }
}
