use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

/// Format version written into new documents.
pub const FORMAT_VERSION: &str = "1.0";

/// A recorded or hand-written script.
///
/// This is the persisted `.ghostclick` document:
/// - `version`: document format version
/// - `name`: display name
/// - `repeat_count`: how many times the steps are played (0 = until stopped)
/// - `steps`: the ordered actions
///
/// Unknown fields are ignored on load; missing fields fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Script {
    /// Document format version.
    #[serde(default = "default_version")]
    pub version: String,

    /// Display name of the script.
    #[serde(default = "default_name")]
    pub name: String,

    /// Number of passes over `steps`; 0 repeats until playback is stopped.
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,

    /// Ordered actions. `steps[i].delay_before` is the wait before step `i`, including step 0.
    #[serde(default)]
    #[validate]
    pub steps: Vec<Action>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: default_name(),
            repeat_count: default_repeat_count(),
            steps: Vec::new(),
        }
    }
}

impl Script {
    /// Create an empty script with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// True if `repeat_count` is 0 (repeat until stopped).
    pub fn is_infinite(&self) -> bool {
        self.repeat_count == 0
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// One playable pointer operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Action {
    /// Absolute screen X coordinate.
    #[serde(default)]
    pub x: i32,

    /// Absolute screen Y coordinate.
    #[serde(default)]
    pub y: i32,

    /// What to do at (x, y).
    #[serde(rename = "click_type", default)]
    pub kind: ActionKind,

    /// Seconds to wait before this step runs (scaled by the playback speed).
    #[serde(default = "default_delay_before")]
    #[validate(minimum = 0.0)]
    pub delay_before: f64,

    /// Glide the cursor back to where it was once the action is done.
    #[serde(default)]
    pub return_cursor: bool,

    /// Free-form label shown next to the step.
    #[serde(default)]
    pub label: String,

    /// Glide to the target before acting.
    #[serde(rename = "move_to", default = "default_move_to")]
    pub move_to_first: bool,
}

impl Default for Action {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            kind: ActionKind::default(),
            delay_before: default_delay_before(),
            return_cursor: false,
            label: String::new(),
            move_to_first: default_move_to(),
        }
    }
}

impl Action {
    /// Build an action of `kind` at (x, y) waiting `delay_before` seconds.
    pub fn new(kind: ActionKind, x: i32, y: i32, delay_before: f64) -> Self {
        Self {
            x,
            y,
            kind,
            delay_before,
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_return_cursor(mut self, return_cursor: bool) -> Self {
        self.return_cursor = return_cursor;
        self
    }

    pub fn with_move_to_first(mut self, move_to_first: bool) -> Self {
        self.move_to_first = move_to_first;
        self
    }

    /// One-line summary for step listings, e.g. `[login] L-Click @ (10, 20) - 0.50s (return)`.
    pub fn describe(&self) -> String {
        let tag = if self.label.is_empty() {
            String::new()
        } else {
            format!("[{}] ", self.label)
        };
        let ret = if self.return_cursor { " (return)" } else { "" };
        format!(
            "{tag}{} @ ({}, {}) - {:.2}s{ret}",
            self.kind.short_name(),
            self.x,
            self.y,
            self.delay_before
        )
    }
}

/// Action kind enumeration.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ActionKind {
    #[default]
    #[serde(rename = "left")]
    LeftClick,
    #[serde(rename = "right")]
    RightClick,
    #[serde(rename = "double")]
    DoubleClick,
    #[serde(rename = "move")]
    Move,
}

impl ActionKind {
    pub fn short_name(self) -> &'static str {
        match self {
            ActionKind::LeftClick => "L-Click",
            ActionKind::RightClick => "R-Click",
            ActionKind::DoubleClick => "Dbl-Click",
            ActionKind::Move => "Move",
        }
    }
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

fn default_name() -> String {
    "Untitled".to_string()
}

fn default_repeat_count() -> u32 {
    1
}

fn default_delay_before() -> f64 {
    0.5
}

fn default_move_to() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_includes_label_and_return() {
        let a = Action::new(ActionKind::LeftClick, 10, 20, 0.5)
            .with_label("login")
            .with_return_cursor(true);
        assert_eq!(a.describe(), "[login] L-Click @ (10, 20) - 0.50s (return)");

        let b = Action::new(ActionKind::Move, 1, 2, 0.0);
        assert_eq!(b.describe(), "Move @ (1, 2) - 0.00s");
    }

    #[test]
    fn defaults_match_document_defaults() {
        let a = Action::default();
        assert_eq!(a.kind, ActionKind::LeftClick);
        assert_eq!(a.delay_before, 0.5);
        assert!(!a.return_cursor);
        assert!(a.move_to_first);

        let s = Script::default();
        assert_eq!(s.name, "Untitled");
        assert_eq!(s.version, FORMAT_VERSION);
        assert_eq!(s.repeat_count, 1);
        assert!(!s.is_infinite());
    }

    #[test]
    fn negative_delay_fails_validation() {
        let mut s = Script::new("bad");
        s.steps.push(Action::new(ActionKind::LeftClick, 0, 0, -1.0));
        assert!(s.validate().is_err());

        s.steps[0].delay_before = 0.0;
        assert!(s.validate().is_ok());
    }
}
