#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

/*!
Player module for Ghostclick.

This module wires together:
- `actuator`: the pointer-control seam (`Actuator`) and its Enigo implementation
- `config`: playback speed, pauses, glide duration and the safety zone
- `runtime`: the cancellable playback loop (`Player`)

Typical usage:
- Construct a `Player` with an actuator and a `PlaybackConfig`.
- Register callbacks, then call `Player::start` with a script from within a Tokio runtime.

Example:
```no_run
use ghostclick::player::{EnigoActuator, PlaybackConfig, Player};
use ghostclick::script::Script;

# async fn demo() -> ghostclick::Result<()> {
let player = Player::new(Box::new(EnigoActuator::new()), PlaybackConfig::default())?;
player.on_step_change(|i| println!("step {i}"));
if let Some(handle) = player.start(Script::new("demo"), true) {
    let _outcome = handle.await;
}
# Ok(())
# }
```
*/

pub mod actuator;
pub mod config;
pub mod runtime;

pub use actuator::{Actuator, EnigoActuator, PointerButton};
pub use config::{Corner, DEFAULT_GLIDE, PlaybackConfig, SafetyZone};
pub use runtime::{PlaybackOutcome, Player};
