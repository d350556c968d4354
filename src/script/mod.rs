//! Script module for Ghostclick.
//!
//! This module wires together the action model, the `.ghostclick` document
//! loader and the undoable editor. Import from here for a convenient, stable API.
//!
//! Example:
//! ```no_run
//! use ghostclick::script::{ActionKind, Action, ScriptEditor, load_from_path, save_to_path};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut editor = ScriptEditor::new(load_from_path("daily.ghostclick")?);
//!     editor.add_step(Action::new(ActionKind::RightClick, 640, 360, 0.5), None);
//!     save_to_path(editor.script(), "daily")?;
//!     Ok(())
//! }
//! ```

pub mod editor;
pub mod history;
pub mod loader;
pub mod models;

pub use editor::{MoveDirection, ScriptEditor};
pub use history::{EditHistory, MAX_UNDO_HISTORY};
pub use models::{Action, ActionKind, FORMAT_VERSION, Script};

pub use loader::{
    SCRIPT_EXTENSION, generate_schema, load_from_path, load_from_path_async, load_from_reader,
    load_from_slice, load_from_str, save_to_path, save_to_writer, to_string_pretty,
    validate_script, with_script_extension, write_schema_to_writer,
};
