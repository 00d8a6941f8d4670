//! Bounded snapshot stack for undo/redo.
//!
//! Every entry is a full deep copy of the layer stack (active index
//! included), so a stored state can never alias the live, mutable one. The
//! memory cost is deliberate and bounded by [`MAX_HISTORY`]. Callers invoke
//! [`History::save`] immediately before each mutating operation; nothing is
//! snapshotted automatically.

use crate::layers::LayerStack;
use std::time::{SystemTime, UNIX_EPOCH};

pub const MAX_HISTORY: usize = 100;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub stack: LayerStack,
    pub timestamp_ms: u64,
}

impl Snapshot {
    fn capture(stack: &LayerStack) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            stack: stack.clone(),
            timestamp_ms,
        }
    }
}

#[derive(Debug)]
pub struct History {
    entries: Vec<Snapshot>,
    /// Index of the entry describing the current timeline position.
    cursor: usize,
    /// True while the live stack has (or may have) diverged from
    /// `entries[cursor]`, i.e. a mutation followed the last `save`.
    dirty: bool,
    cap: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            dirty: false,
            cap: cap.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && (self.dirty || self.cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        !self.dirty && self.cursor + 1 < self.entries.len()
    }

    /// Record the pre-mutation state. Any redo entries beyond the current
    /// position are discarded; the oldest entry is dropped once the cap is
    /// reached.
    pub fn save(&mut self, live: &LayerStack) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
            // The cursor entry may already equal the live state (right after
            // an undo/redo, or when the previous edit was a no-op);
            // re-appending it would cost an extra undo step later.
            if self.entries[self.cursor].stack == *live {
                self.dirty = true;
                return;
            }
        }
        self.push_capped(Snapshot::capture(live));
        self.dirty = true;
    }

    /// Step back one state. Returns the stack to restore, or `None` when
    /// nothing older exists.
    pub fn undo(&mut self, live: &LayerStack) -> Option<LayerStack> {
        if self.entries.is_empty() {
            return None;
        }
        if self.dirty {
            self.dirty = false;
            if self.entries[self.cursor].stack != *live {
                // Stash the live state at the tip so redo can return here.
                self.entries.truncate(self.cursor + 1);
                let restore = self.cursor;
                let dropped = self.push_capped(Snapshot::capture(live));
                self.cursor = restore.saturating_sub(dropped as usize);
                return Some(self.entries[self.cursor].stack.clone());
            }
        }
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].stack.clone())
    }

    /// Step forward one state. Returns `None` at the timeline tip.
    pub fn redo(&mut self) -> Option<LayerStack> {
        if self.dirty || self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].stack.clone())
    }

    fn push_capped(&mut self, snapshot: Snapshot) -> bool {
        self.entries.push(snapshot);
        let dropped = self.entries.len() > self.cap;
        if dropped {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;
        dropped
    }
}
