//! Layer stack and the data-composite rule.
//!
//! Compositing for editing and export ignores layer opacity on purpose:
//! opacity is a rendering-only hint for on-screen preview, while the exported
//! chart always contains the topmost visible stitch. Keeping the two rules
//! distinct is a documented asymmetry, not an oversight.

use crate::error::{PatternError, Result};
use crate::grid::PixelGrid;
use serde::{Deserialize, Serialize};

pub const MAX_LAYERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: u32,
    pub name: String,
    pub grid: PixelGrid,
    pub visible: bool,
    /// Rendering-only hint in [0, 1]; never consulted by [`LayerStack::composite`].
    pub opacity: f32,
    pub locked: bool,
}

impl Layer {
    fn new(id: u32, name: String, width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            id,
            name,
            grid: PixelGrid::new(width, height)?,
            visible: true,
            opacity: 1.0,
            locked: false,
        })
    }
}

/// Ordered stack of layers, index 0 at the bottom. Always holds between 1 and
/// [`MAX_LAYERS`] layers, and `active_index` always points at a live layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStack {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
    active_index: usize,
    next_id: u32,
}

impl LayerStack {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let background = Layer::new(0, "Background".to_string(), width, height)?;
        Ok(Self {
            width,
            height,
            layers: vec![background],
            active_index: 0,
            next_id: 1,
        })
    }

    /// Wrap a converted grid as the bottom layer of a fresh stack.
    pub fn from_grid(grid: PixelGrid) -> Self {
        let width = grid.width();
        let height = grid.height();
        Self {
            width,
            height,
            layers: vec![Layer {
                id: 0,
                name: "Background".to_string(),
                grid,
                visible: true,
                opacity: 1.0,
                locked: false,
            }],
            active_index: 0,
            next_id: 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active(&self) -> &Layer {
        &self.layers[self.active_index]
    }

    /// Mutable grid of the active layer, or `None` when the layer is locked.
    /// All pixel mutation is expected to flow through this gate.
    pub fn active_grid_mut(&mut self) -> Option<&mut PixelGrid> {
        let layer = &mut self.layers[self.active_index];
        (!layer.locked).then_some(&mut layer.grid)
    }

    /// Select the mutation target. Out-of-range indices are ignored.
    pub fn set_active(&mut self, index: usize) {
        if index < self.layers.len() {
            self.active_index = index;
        }
    }

    /// Insert a new empty layer directly above the active one and make it
    /// active.
    pub fn add_layer(&mut self, name: &str) -> Result<()> {
        if self.layers.len() >= MAX_LAYERS {
            return Err(PatternError::LayerLimit { max: MAX_LAYERS });
        }
        let layer = Layer::new(self.next_id, name.to_string(), self.width, self.height)?;
        self.next_id += 1;
        self.active_index += 1;
        self.layers.insert(self.active_index, layer);
        Ok(())
    }

    pub fn delete_active(&mut self) -> Result<()> {
        if self.layers.len() == 1 {
            return Err(PatternError::LastLayer);
        }
        self.layers.remove(self.active_index);
        if self.active_index >= self.layers.len() {
            self.active_index = self.layers.len() - 1;
        }
        Ok(())
    }

    pub fn duplicate_active(&mut self) -> Result<()> {
        if self.layers.len() >= MAX_LAYERS {
            return Err(PatternError::LayerLimit { max: MAX_LAYERS });
        }
        let mut copy = self.layers[self.active_index].clone();
        copy.id = self.next_id;
        copy.name = format!("{} copy", copy.name);
        self.next_id += 1;
        self.active_index += 1;
        self.layers.insert(self.active_index, copy);
        Ok(())
    }

    /// Move the layer at `from` to position `to`, keeping the active index on
    /// the same logical layer. Out-of-range positions are ignored.
    pub fn reorder(&mut self, from: usize, to: usize) {
        if from >= self.layers.len() || to >= self.layers.len() || from == to {
            return;
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);

        if self.active_index == from {
            self.active_index = to;
        } else if from < self.active_index && self.active_index <= to {
            self.active_index -= 1;
        } else if to <= self.active_index && self.active_index < from {
            self.active_index += 1;
        }
    }

    /// Move the active layer up (+1) or down (-1) one position.
    pub fn move_active(&mut self, delta: i32) {
        let target = self.active_index as i32 + delta;
        if target < 0 || target as usize >= self.layers.len() {
            return;
        }
        self.reorder(self.active_index, target as usize);
    }

    /// Merge the active layer into the layer below it; the merged result
    /// becomes active. A locked layer below silently rejects the merge.
    pub fn merge_down(&mut self) -> Result<()> {
        if self.active_index == 0 {
            return Ok(());
        }
        if self.layers[self.active_index - 1].locked {
            return Ok(());
        }
        let upper = self.layers.remove(self.active_index);
        self.active_index -= 1;
        let lower = &mut self.layers[self.active_index];
        for (x, y, cell) in upper.grid.iter_cells() {
            if cell.is_some() {
                lower.grid.set(x as i32, y as i32, cell);
            }
        }
        Ok(())
    }

    pub fn set_visible(&mut self, index: usize, visible: bool) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.visible = visible;
        }
    }

    pub fn set_locked(&mut self, index: usize, locked: bool) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.locked = locked;
        }
    }

    pub fn set_opacity(&mut self, index: usize, opacity: f32) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    /// Flatten visible layers bottom to top: a visible layer's non-empty cell
    /// overwrites whatever is below it.
    pub fn composite(&self) -> PixelGrid {
        let mut out = PixelGrid::new(self.width, self.height)
            .expect("stack dimensions are validated at construction");
        for layer in &self.layers {
            if !layer.visible {
                continue;
            }
            for (x, y, cell) in layer.grid.iter_cells() {
                if cell.is_some() {
                    out.set(x as i32, y as i32, cell);
                }
            }
        }
        out
    }
}
