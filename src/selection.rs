//! Selection mask algebra: rectangular and magic-wand selection, bounds,
//! move, and the clipboard operations built on them.
//!
//! "No selection" is the absence of a [`Selection`], not an all-false mask;
//! the editor holds `Option<Selection>` and drops it on deselect.

use crate::catalog::ColorId;
use crate::grid::PixelGrid;
use serde::{Deserialize, Serialize};

/// Inclusive bounding box of selected cells.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl SelectionBounds {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Boolean mask with the same dimensions as the grid it selects over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    width: u32,
    height: u32,
    mask: Vec<bool>,
    anchor: (i32, i32),
}

impl Selection {
    /// Rectangular selection spanning the inclusive box between `anchor` and
    /// `live`, clipped to the grid.
    pub fn rect(width: u32, height: u32, anchor: (i32, i32), live: (i32, i32)) -> Self {
        let mut selection = Self {
            width,
            height,
            mask: vec![false; width as usize * height as usize],
            anchor,
        };
        selection.apply_rect(live);
        selection
    }

    /// Rebuild the rectangle from the stored anchor to a new live point, as
    /// the pointer drags.
    pub fn update_live(&mut self, live: (i32, i32)) {
        self.mask.fill(false);
        self.apply_rect(live);
    }

    fn apply_rect(&mut self, live: (i32, i32)) {
        let (ax, ay) = self.anchor;
        let (lx, ly) = live;
        let min_x = ax.min(lx).max(0);
        let min_y = ay.min(ly).max(0);
        let max_x = ax.max(lx).min(self.width as i32 - 1);
        let max_y = ay.max(ly).min(self.height as i32 - 1);
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                self.mask[y as usize * self.width as usize + x as usize] = true;
            }
        }
    }

    /// 4-connected region of cells matching the seed's color. Returns `None`
    /// when the seed is out of bounds. Uses an explicit stack; grid-sized
    /// regions must not recurse.
    pub fn magic_wand(grid: &PixelGrid, seed_x: i32, seed_y: i32) -> Option<Self> {
        if !grid.in_bounds(seed_x, seed_y) {
            return None;
        }
        let width = grid.width();
        let height = grid.height();
        let target = grid.get(seed_x, seed_y);

        let mut selection = Self {
            width,
            height,
            mask: vec![false; width as usize * height as usize],
            anchor: (seed_x, seed_y),
        };
        let mut stack = vec![(seed_x, seed_y)];
        while let Some((x, y)) = stack.pop() {
            if !grid.in_bounds(x, y) || grid.get(x, y) != target {
                continue;
            }
            let i = y as usize * width as usize + x as usize;
            if selection.mask[i] {
                continue;
            }
            selection.mask[i] = true;
            stack.push((x - 1, y));
            stack.push((x + 1, y));
            stack.push((x, y - 1));
            stack.push((x, y + 1));
        }
        Some(selection)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0
            && y >= 0
            && (x as u32) < self.width
            && (y as u32) < self.height
            && self.mask[y as usize * self.width as usize + x as usize]
    }

    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.mask.contains(&true)
    }

    /// Tight bounding box, `None` iff no cell is selected.
    pub fn bounds(&self) -> Option<SelectionBounds> {
        let mut bounds: Option<SelectionBounds> = None;
        for (i, &set) in self.mask.iter().enumerate() {
            if !set {
                continue;
            }
            let x = i as u32 % self.width;
            let y = i as u32 / self.width;
            match &mut bounds {
                None => {
                    bounds = Some(SelectionBounds {
                        min_x: x,
                        min_y: y,
                        max_x: x,
                        max_y: y,
                    })
                }
                Some(b) => {
                    b.min_x = b.min_x.min(x);
                    b.min_y = b.min_y.min(y);
                    b.max_x = b.max_x.max(x);
                    b.max_y = b.max_y.max(y);
                }
            }
        }
        bounds
    }

    /// Translate the mask; cells that would leave the grid are dropped.
    pub fn translate(&mut self, dx: i32, dy: i32) {
        let mut moved = vec![false; self.mask.len()];
        for (i, &set) in self.mask.iter().enumerate() {
            if !set {
                continue;
            }
            let x = i as i32 % self.width as i32 + dx;
            let y = i as i32 / self.width as i32 + dy;
            if x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height {
                moved[y as usize * self.width as usize + x as usize] = true;
            }
        }
        self.mask = moved;
        self.anchor = (self.anchor.0 + dx, self.anchor.1 + dy);
    }

    #[cfg(test)]
    fn mark(&mut self, x: u32, y: u32) {
        self.mask[y as usize * self.width as usize + x as usize] = true;
    }
}

/// Bounding-box snapshot of a copied selection. Cells inside the box that
/// were not selected are stored empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clipboard {
    data: PixelGrid,
}

impl Clipboard {
    pub fn width(&self) -> u32 {
        self.data.width()
    }

    pub fn height(&self) -> u32 {
        self.data.height()
    }

    pub fn data(&self) -> &PixelGrid {
        &self.data
    }

    /// Reverse the clipboard's columns in place.
    pub fn flip_horizontal(&mut self) {
        let (w, h) = (self.data.width() as i32, self.data.height() as i32);
        let mut flipped = PixelGrid::new(w as u32, h as u32).expect("clipboard is nonzero");
        for y in 0..h {
            for x in 0..w {
                flipped.set(w - 1 - x, y, self.data.get(x, y));
            }
        }
        self.data = flipped;
    }

    /// Reverse the clipboard's rows in place.
    pub fn flip_vertical(&mut self) {
        let (w, h) = (self.data.width() as i32, self.data.height() as i32);
        let mut flipped = PixelGrid::new(w as u32, h as u32).expect("clipboard is nonzero");
        for y in 0..h {
            for x in 0..w {
                flipped.set(x, h - 1 - y, self.data.get(x, y));
            }
        }
        self.data = flipped;
    }
}

/// Extract the selection's bounding box into a clipboard. `None` when the
/// selection has no cells.
pub fn copy_selection(grid: &PixelGrid, selection: &Selection) -> Option<Clipboard> {
    let b = selection.bounds()?;
    let mut data = PixelGrid::new(b.width(), b.height()).ok()?;
    for y in b.min_y..=b.max_y {
        for x in b.min_x..=b.max_x {
            if selection.contains(x as i32, y as i32) {
                data.set(
                    (x - b.min_x) as i32,
                    (y - b.min_y) as i32,
                    grid.get(x as i32, y as i32),
                );
            }
        }
    }
    Some(Clipboard { data })
}

/// Copy, then clear the selected source cells.
pub fn cut_selection(grid: &mut PixelGrid, selection: &Selection) -> Option<Clipboard> {
    let clipboard = copy_selection(grid, selection)?;
    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            if selection.contains(x, y) {
                grid.set(x, y, None);
            }
        }
    }
    Some(clipboard)
}

/// Overlay non-empty clipboard cells at `(origin_x, origin_y)`. Destination
/// cells under empty clipboard cells are left untouched; cells landing
/// outside the grid are dropped.
pub fn paste_clipboard(grid: &mut PixelGrid, clipboard: &Clipboard, origin_x: i32, origin_y: i32) {
    for (x, y, cell) in clipboard.data.iter_cells() {
        if cell.is_some() {
            grid.set(origin_x + x as i32, origin_y + y as i32, cell);
        }
    }
}

/// Translate selected content and the mask together by `(dx, dy)`. Source
/// cells are cleared; cells that would land outside the grid are dropped.
pub fn move_selection(grid: &mut PixelGrid, selection: &mut Selection, dx: i32, dy: i32) {
    if dx == 0 && dy == 0 {
        return;
    }
    let mut carried: Vec<(i32, i32, Option<ColorId>)> = Vec::new();
    for y in 0..grid.height() as i32 {
        for x in 0..grid.width() as i32 {
            if selection.contains(x, y) {
                carried.push((x + dx, y + dy, grid.get(x, y)));
                grid.set(x, y, None);
            }
        }
    }
    for (x, y, cell) in carried {
        grid.set(x, y, cell);
    }
    selection.translate(dx, dy);
}
