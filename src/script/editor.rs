use tracing::{debug, trace};

use super::history::EditHistory;
use super::loader;
use super::models::{Action, Script};

/// Direction for [`ScriptEditor::move_step`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Editing session over a [`Script`] with bounded undo/redo.
///
/// Every step mutation snapshots the previous steps first; metadata changes
/// (name, repeat count) are not part of the history.
#[derive(Debug, Clone, Default)]
pub struct ScriptEditor {
    script: Script,
    history: EditHistory,
}

impl ScriptEditor {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            history: EditHistory::new(),
        }
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn steps(&self) -> &[Action] {
        &self.script.steps
    }

    pub fn into_script(self) -> Script {
        self.script
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.script.name = name.into();
    }

    pub fn set_repeat_count(&mut self, repeat_count: u32) {
        self.script.repeat_count = repeat_count;
    }

    /// Insert `action` at `index` (clamped to the end), or append when `index` is `None`.
    pub fn add_step(&mut self, action: Action, index: Option<usize>) {
        self.snapshot();
        match index {
            Some(i) => {
                let i = i.min(self.script.steps.len());
                self.script.steps.insert(i, action);
            }
            None => self.script.steps.push(action),
        }
    }

    /// Append a recorded batch as one undoable edit.
    pub fn append_steps(&mut self, actions: Vec<Action>) {
        if actions.is_empty() {
            return;
        }
        self.snapshot();
        debug!(target: "ghostclick::script", count = actions.len(), "Appending recorded steps");
        self.script.steps.extend(actions);
    }

    /// Replace the step at `index`. Out of range is a no-op.
    pub fn edit_step(&mut self, index: usize, action: Action) -> bool {
        if index >= self.script.steps.len() {
            return false;
        }
        self.snapshot();
        self.script.steps[index] = action;
        true
    }

    /// Remove the step at `index`. Out of range is a no-op.
    pub fn delete_step(&mut self, index: usize) -> Option<Action> {
        if index >= self.script.steps.len() {
            return None;
        }
        self.snapshot();
        Some(self.script.steps.remove(index))
    }

    /// Swap a step with its neighbour. Returns the step's new index
    /// (unchanged when the move would leave the list).
    pub fn move_step(&mut self, index: usize, direction: MoveDirection) -> usize {
        let len = self.script.steps.len();
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => index.checked_add(1).filter(|t| *t < len),
        };
        match target {
            Some(target) if index < len => {
                self.snapshot();
                self.script.steps.swap(index, target);
                target
            }
            _ => index,
        }
    }

    /// Remove every step.
    pub fn clear(&mut self) {
        self.snapshot();
        self.script.steps.clear();
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.script.steps)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.script.steps)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Replace the script from a serialized document and reset the history.
    /// On error the editor is left untouched.
    pub fn load_str(&mut self, document: &str) -> crate::Result<()> {
        let script = loader::load_from_str(document)?;
        self.replace(script);
        Ok(())
    }

    /// Replace the script wholesale and reset the history.
    pub fn replace(&mut self, script: Script) {
        self.script = script;
        self.history.clear();
    }

    fn snapshot(&mut self) {
        trace!(target: "ghostclick::script", steps = self.script.steps.len(), "Snapshot for undo");
        self.history.record(&self.script.steps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::history::MAX_UNDO_HISTORY;
    use crate::script::models::ActionKind;

    fn step(x: i32) -> Action {
        Action::new(ActionKind::LeftClick, x, x, 0.1)
    }

    fn editor_with(n: i32) -> ScriptEditor {
        let mut script = Script::new("t");
        script.steps = (0..n).map(step).collect();
        ScriptEditor::new(script)
    }

    #[test]
    fn n_edits_then_n_undos_restore_original() {
        let mut ed = editor_with(3);
        let original = ed.steps().to_vec();

        ed.add_step(step(10), None);
        ed.add_step(step(11), Some(0));
        ed.edit_step(2, step(12));
        ed.delete_step(1);
        assert_eq!(ed.move_step(0, MoveDirection::Down), 1);
        ed.clear();
        let edited = ed.steps().to_vec();

        for _ in 0..6 {
            assert!(ed.undo());
        }
        assert!(!ed.undo());
        assert_eq!(ed.steps(), original.as_slice());

        for _ in 0..6 {
            assert!(ed.redo());
        }
        assert_eq!(ed.steps(), edited.as_slice());
    }

    #[test]
    fn fifty_edits_are_all_undoable() {
        let mut ed = editor_with(0);
        for x in 0..MAX_UNDO_HISTORY as i32 {
            ed.add_step(step(x), None);
        }
        for _ in 0..MAX_UNDO_HISTORY {
            assert!(ed.undo());
        }
        assert!(ed.steps().is_empty());
        assert!(ed.redo());
        assert_eq!(ed.steps(), &[step(0)]);
    }

    #[test]
    fn new_edit_after_undo_clears_redo() {
        let mut ed = editor_with(1);
        ed.add_step(step(5), None);
        assert!(ed.undo());
        assert!(ed.can_redo());
        ed.add_step(step(6), None);
        assert!(!ed.can_redo());
        assert!(!ed.redo());
    }

    #[test]
    fn out_of_range_edits_do_not_snapshot() {
        let mut ed = editor_with(2);
        assert!(!ed.edit_step(5, step(9)));
        assert!(ed.delete_step(2).is_none());
        assert_eq!(ed.move_step(0, MoveDirection::Up), 0);
        assert_eq!(ed.move_step(1, MoveDirection::Down), 1);
        assert_eq!(ed.move_step(7, MoveDirection::Up), 7);
        assert!(!ed.can_undo());
    }

    #[test]
    fn append_steps_is_one_edit() {
        let mut ed = editor_with(1);
        ed.append_steps(vec![step(2), step(3)]);
        assert_eq!(ed.steps().len(), 3);
        assert!(ed.undo());
        assert_eq!(ed.steps().len(), 1);
        ed.append_steps(Vec::new());
        assert!(!ed.can_undo());
    }

    #[test]
    fn failed_load_leaves_editor_untouched() {
        let mut ed = editor_with(2);
        ed.add_step(step(9), None);
        let before = ed.script().clone();
        assert!(ed.load_str(r#"{"steps":[{"delay_before":-1}]}"#).is_err());
        assert_eq!(ed.script(), &before);
        assert!(ed.can_undo());

        ed.load_str(r#"{"name":"fresh","steps":[]}"#).unwrap();
        assert_eq!(ed.script().name, "fresh");
        assert!(!ed.can_undo());
    }
}
