#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! Ghostclick: record pointer clicks and moves, then replay them with Enigo.
//!
//! The crate is split into cohesive modules:
//! - `script`: the action model, the persisted document codec and the undoable editor.
//! - `recorder`: classifies a raw input-hook stream into discrete actions.
//! - `player`: replays a script on a cancellable, timed loop through an `Actuator`.
//! - `utils`: glide paths and cancellation-aware sleeping.
//!
//! Use `ghostclick::prelude::*` to bring commonly used items into scope quickly.

/// Public module: error type shared by every component.
pub mod error;
/// Public module: playback engine (actuator, config, runtime loop).
pub mod player;
/// Public module: recording (input hooks, classifier, recorder session).
pub mod recorder;
/// Public module: action model, document loader and editor.
pub mod script;
/// Public module: utilities (glide paths, timing).
pub mod utils;

pub use error::{Error, Result};

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Parse a log level name (trace|debug|info|warn|error).
pub fn parse_level(s: &str) -> Option<tracing::Level> {
    use tracing::Level;
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging) with a reasonable default.
/// - Honors the `RUST_LOG` environment variable if set.
/// - Falls back to `info` level.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| parse_level(&s))
        .unwrap_or(tracing::Level::INFO);
    init_tracing_with_level(level);
}

/// Initialize tracing at an explicit level. Ignored if a subscriber is already set.
pub fn init_tracing_with_level(level: tracing::Level) {
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use ghostclick::prelude::*;`
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::player::{
        Actuator, EnigoActuator, PlaybackConfig, PlaybackOutcome, Player, PointerButton,
        SafetyZone,
    };
    pub use crate::recorder::{InputHook, RawEvent, Recorder, RecorderConfig};
    pub use crate::script::{Action, ActionKind, Script, ScriptEditor};

    pub use std::time::Duration;
    pub use tracing::{debug, error, info, trace, warn};

    pub use crate as ghostclick;
    pub use enigo;
}
