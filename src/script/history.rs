//! Bounded undo/redo over full snapshots of a script's steps.

use super::models::Action;

/// Maximum number of undo snapshots kept.
pub const MAX_UNDO_HISTORY: usize = 50;

type Snapshot = Vec<Action>;

/// Undo/redo stacks of step snapshots.
#[derive(Debug, Clone)]
pub struct EditHistory {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_entries: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EditHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_UNDO_HISTORY)
    }

    /// History that keeps at most `max_entries` undo snapshots (at least one).
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Record the state before a mutation. Clears the redo stack.
    pub fn record(&mut self, before: &[Action]) {
        self.undo_stack.push(before.to_vec());
        if self.undo_stack.len() > self.max_entries {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Swap `current` with the last undo snapshot. Returns false when there is nothing to undo.
    pub fn undo(&mut self, current: &mut Vec<Action>) -> bool {
        match self.undo_stack.pop() {
            Some(prev) => {
                self.redo_stack.push(std::mem::replace(current, prev));
                true
            }
            None => false,
        }
    }

    /// Swap `current` with the last redo snapshot. Returns false when there is nothing to redo.
    pub fn redo(&mut self, current: &mut Vec<Action>) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                self.undo_stack.push(std::mem::replace(current, next));
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[cfg(test)]
    fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
