//! The single mutation authority over a pattern document.
//!
//! All ambient editing state (layer stack, selection, clipboard, history)
//! lives in one owned aggregate, and every edit goes through an explicit
//! command method here. Commands snapshot history immediately before
//! mutating, honor layer locks silently, and keep the selection consistent
//! with structural changes. Hosts hold exactly one `PatternEditor` per open
//! document; renderers and exporters read [`PatternEditor::composite`]
//! snapshots, never the live layers.

use crate::catalog::ColorId;
use crate::draw;
use crate::error::Result;
use crate::grid::PixelGrid;
use crate::history::History;
use crate::layers::LayerStack;
use crate::pipeline::ConversionOutcome;
use crate::selection::{
    copy_selection, cut_selection, move_selection, paste_clipboard, Clipboard, Selection,
};

pub struct PatternEditor {
    stack: LayerStack,
    selection: Option<Selection>,
    clipboard: Option<Clipboard>,
    history: History,
}

impl PatternEditor {
    /// Start from a blank single-layer document.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self::from_stack(LayerStack::new(width, height)?))
    }

    /// Continue editing a previously loaded stack.
    pub fn from_stack(stack: LayerStack) -> Self {
        Self {
            stack,
            selection: None,
            clipboard: None,
            history: History::new(),
        }
    }

    /// Start editing a converted photograph.
    pub fn from_conversion(outcome: ConversionOutcome) -> Self {
        Self::from_stack(LayerStack::from_grid(outcome.grid))
    }

    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    /// Flattened grid for rendering, export, and material counts.
    pub fn composite(&self) -> PixelGrid {
        self.stack.composite()
    }

    fn active_locked(&self) -> bool {
        self.stack.active().locked
    }

    // ---- painting ----------------------------------------------------------

    pub fn paint_cell(&mut self, x: i32, y: i32, color: Option<ColorId>) {
        if self.active_locked() {
            return;
        }
        self.history.save(&self.stack);
        if let Some(grid) = self.stack.active_grid_mut() {
            grid.set(x, y, color);
        }
    }

    pub fn stroke_brush(
        &mut self,
        from: (i32, i32),
        to: (i32, i32),
        color: Option<ColorId>,
        size: u32,
    ) {
        if self.active_locked() {
            return;
        }
        self.history.save(&self.stack);
        if let Some(grid) = self.stack.active_grid_mut() {
            draw::draw_brush(grid, from, to, color, size);
        }
    }

    pub fn draw_line(&mut self, from: (i32, i32), to: (i32, i32), color: Option<ColorId>) {
        if self.active_locked() {
            return;
        }
        self.history.save(&self.stack);
        if let Some(grid) = self.stack.active_grid_mut() {
            draw::draw_line(grid, from, to, color);
        }
    }

    pub fn draw_rect(
        &mut self,
        corner_a: (i32, i32),
        corner_b: (i32, i32),
        color: Option<ColorId>,
        filled: bool,
    ) {
        if self.active_locked() {
            return;
        }
        self.history.save(&self.stack);
        if let Some(grid) = self.stack.active_grid_mut() {
            draw::draw_rect(grid, corner_a, corner_b, color, filled);
        }
    }

    pub fn flood_fill(&mut self, x: i32, y: i32, color: Option<ColorId>) {
        if self.active_locked() {
            return;
        }
        self.history.save(&self.stack);
        if let Some(grid) = self.stack.active_grid_mut() {
            draw::flood_fill(grid, x, y, color);
        }
    }

    // ---- selection ---------------------------------------------------------

    pub fn select_rect(&mut self, anchor: (i32, i32), live: (i32, i32)) {
        self.selection = Some(Selection::rect(
            self.stack.width(),
            self.stack.height(),
            anchor,
            live,
        ));
    }

    /// Extend the in-progress rectangular selection to a new live point.
    pub fn drag_selection(&mut self, live: (i32, i32)) {
        if let Some(selection) = &mut self.selection {
            selection.update_live(live);
        }
    }

    /// Select the 4-connected same-color region under the seed, from the
    /// active layer.
    pub fn magic_wand(&mut self, x: i32, y: i32) {
        self.selection = Selection::magic_wand(&self.stack.active().grid, x, y);
    }

    pub fn deselect(&mut self) {
        self.selection = None;
    }

    /// Translate selected content on the active layer. A zero offset is a
    /// complete no-op: no history entry, no mask change.
    pub fn commit_move(&mut self, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }
        if self.active_locked() {
            return;
        }
        let Some(selection) = &mut self.selection else {
            return;
        };
        if selection.is_empty() {
            return;
        }
        self.history.save(&self.stack);
        if let Some(grid) = self.stack.active_grid_mut() {
            move_selection(grid, selection, dx, dy);
        }
    }

    // ---- clipboard ---------------------------------------------------------

    pub fn copy(&mut self) {
        if let Some(selection) = &self.selection {
            if let Some(clipboard) = copy_selection(&self.stack.active().grid, selection) {
                self.clipboard = Some(clipboard);
            }
        }
    }

    pub fn cut(&mut self) {
        if self.active_locked() {
            return;
        }
        let Some(selection) = self.selection.clone() else {
            return;
        };
        if selection.is_empty() {
            return;
        }
        self.history.save(&self.stack);
        if let Some(grid) = self.stack.active_grid_mut() {
            if let Some(clipboard) = cut_selection(grid, &selection) {
                self.clipboard = Some(clipboard);
            }
        }
    }

    /// Overlay the clipboard at the given origin and drop the selection.
    pub fn paste(&mut self, origin_x: i32, origin_y: i32) {
        if self.active_locked() {
            return;
        }
        let Some(clipboard) = self.clipboard.clone() else {
            return;
        };
        self.history.save(&self.stack);
        if let Some(grid) = self.stack.active_grid_mut() {
            paste_clipboard(grid, &clipboard, origin_x, origin_y);
        }
        self.selection = None;
    }

    pub fn flip_clipboard_horizontal(&mut self) {
        if let Some(clipboard) = &mut self.clipboard {
            clipboard.flip_horizontal();
        }
    }

    pub fn flip_clipboard_vertical(&mut self) {
        if let Some(clipboard) = &mut self.clipboard {
            clipboard.flip_vertical();
        }
    }

    // ---- transforms --------------------------------------------------------

    pub fn mirror_horizontal(&mut self) {
        self.transform(|grid, region| draw::mirror_horizontal(grid, region));
    }

    pub fn mirror_vertical(&mut self) {
        self.transform(|grid, region| draw::mirror_vertical(grid, region));
    }

    pub fn rotate_90(&mut self) {
        self.transform(|grid, region| draw::rotate_90(grid, region));
    }

    /// Apply a geometric transform to the selection's bounding box, or to the
    /// whole active layer when nothing is selected.
    fn transform<F>(&mut self, op: F)
    where
        F: FnOnce(&mut PixelGrid, Option<crate::selection::SelectionBounds>),
    {
        if self.active_locked() {
            return;
        }
        let region = self.selection.as_ref().and_then(|s| s.bounds());
        self.history.save(&self.stack);
        if let Some(grid) = self.stack.active_grid_mut() {
            op(grid, region);
        }
    }

    // ---- layers ------------------------------------------------------------

    pub fn add_layer(&mut self, name: &str) -> Result<()> {
        self.history.save(&self.stack);
        self.stack.add_layer(name)
    }

    pub fn delete_layer(&mut self) -> Result<()> {
        self.history.save(&self.stack);
        self.stack.delete_active()?;
        self.selection = None;
        Ok(())
    }

    pub fn duplicate_layer(&mut self) -> Result<()> {
        self.history.save(&self.stack);
        self.stack.duplicate_active()
    }

    pub fn merge_down(&mut self) -> Result<()> {
        self.history.save(&self.stack);
        self.stack.merge_down()?;
        self.selection = None;
        Ok(())
    }

    pub fn move_layer(&mut self, delta: i32) {
        self.history.save(&self.stack);
        self.stack.move_active(delta);
    }

    pub fn set_active_layer(&mut self, index: usize) {
        self.stack.set_active(index);
    }

    pub fn set_layer_visible(&mut self, index: usize, visible: bool) {
        self.history.save(&self.stack);
        self.stack.set_visible(index, visible);
    }

    pub fn set_layer_locked(&mut self, index: usize, locked: bool) {
        self.history.save(&self.stack);
        self.stack.set_locked(index, locked);
    }

    pub fn set_layer_opacity(&mut self, index: usize, opacity: f32) {
        self.history.save(&self.stack);
        self.stack.set_opacity(index, opacity);
    }

    // ---- history -----------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.stack) {
            Some(stack) => {
                log::debug!("undo to {} layers", stack.len());
                self.stack = stack;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(stack) => {
                self.stack = stack;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> PatternEditor {
        PatternEditor::new(4, 4).unwrap()
    }

    #[test]
    fn test_flood_fill_blank_grid_fills_everything() {
        let mut ed = editor();
        ed.flood_fill(0, 0, Some(ColorId(3)));
        let composite = ed.composite();
        assert_eq!(
            composite.cells().iter().filter(|c| c.is_some()).count(),
            16
        );
        assert!(composite.cells().iter().all(|c| *c == Some(ColorId(3))));
    }

    #[test]
    fn test_locked_layer_ignores_paint() {
        let mut ed = editor();
        ed.set_layer_locked(0, true);
        let history_len_before = ed.history.len();
        ed.paint_cell(1, 1, Some(ColorId(2)));
        assert_eq!(ed.composite().get(1, 1), None);
        // A refused mutation must not grow the history either.
        assert_eq!(ed.history.len(), history_len_before);
    }

    #[test]
    fn test_zero_offset_move_is_complete_noop() {
        let mut ed = editor();
        ed.paint_cell(1, 1, Some(ColorId(5)));
        ed.select_rect((1, 1), (2, 2));
        let grid_before = ed.stack.active().grid.clone();
        let selection_before = ed.selection.clone();
        let history_len = ed.history.len();

        ed.commit_move(0, 0);

        assert_eq!(ed.stack.active().grid, grid_before);
        assert_eq!(ed.selection, selection_before);
        assert_eq!(ed.history.len(), history_len);
    }

    #[test]
    fn test_edit_undo_redo_cycle() {
        let mut ed = editor();
        ed.paint_cell(0, 0, Some(ColorId(1)));
        ed.paint_cell(1, 0, Some(ColorId(2)));

        assert!(ed.undo());
        assert_eq!(ed.composite().get(1, 0), None);
        assert_eq!(ed.composite().get(0, 0), Some(ColorId(1)));

        assert!(ed.undo());
        assert!(ed.composite().is_blank());
        assert!(!ed.undo());

        assert!(ed.redo());
        assert!(ed.redo());
        assert_eq!(ed.composite().get(1, 0), Some(ColorId(2)));

        // A fresh edit after undo discards the redo branch.
        assert!(ed.undo());
        ed.paint_cell(3, 3, Some(ColorId(7)));
        assert!(!ed.can_redo());
    }

    #[test]
    fn test_copy_paste_round_trip() {
        let mut ed = editor();
        ed.paint_cell(0, 0, Some(ColorId(4)));
        ed.select_rect((0, 0), (0, 0));
        ed.copy();
        ed.paste(2, 2);
        assert_eq!(ed.composite().get(2, 2), Some(ColorId(4)));
        assert_eq!(ed.composite().get(0, 0), Some(ColorId(4)));
        // Paste consumed the selection.
        assert!(ed.selection().is_none());
    }

    #[test]
    fn test_cut_then_undo_restores_source() {
        let mut ed = editor();
        ed.paint_cell(1, 1, Some(ColorId(4)));
        ed.select_rect((1, 1), (1, 1));
        ed.cut();
        assert_eq!(ed.composite().get(1, 1), None);
        assert!(ed.undo());
        assert_eq!(ed.composite().get(1, 1), Some(ColorId(4)));
    }

    #[test]
    fn test_transform_scopes_to_selection() {
        let mut ed = editor();
        ed.paint_cell(0, 0, Some(ColorId(1)));
        ed.paint_cell(3, 3, Some(ColorId(9)));

        ed.select_rect((0, 0), (1, 1));
        ed.mirror_horizontal();
        assert_eq!(ed.composite().get(1, 0), Some(ColorId(1)));
        assert_eq!(ed.composite().get(0, 0), None);
        // Outside the selection untouched.
        assert_eq!(ed.composite().get(3, 3), Some(ColorId(9)));
    }

    #[test]
    fn test_mirror_whole_layer_without_selection() {
        let mut ed = editor();
        ed.paint_cell(0, 0, Some(ColorId(1)));
        ed.mirror_horizontal();
        assert_eq!(ed.composite().get(3, 0), Some(ColorId(1)));
    }

    #[test]
    fn test_layer_commands_are_undoable() {
        let mut ed = editor();
        ed.add_layer("Detail").unwrap();
        assert_eq!(ed.stack().len(), 2);
        assert!(ed.undo());
        assert_eq!(ed.stack().len(), 1);
    }

    #[test]
    fn test_magic_wand_then_fill() {
        let mut ed = editor();
        ed.draw_rect((0, 0), (1, 1), Some(ColorId(2)), true);
        ed.magic_wand(0, 0);
        assert_eq!(ed.selection().unwrap().count(), 4);
    }
}
