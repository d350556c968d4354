use enigo::Mouse as _;
use enigo::{Button as EButton, Coordinate, Direction, Enigo, Settings};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};

/// Mouse button enumeration shared by the recorder and the player.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

/// Low-level pointer control used by the player.
///
/// Implementations are driven from the playback task, one call at a time.
pub trait Actuator: Send {
    /// Current pointer position in absolute screen coordinates.
    fn location(&mut self) -> Result<(i32, i32)>;

    /// Move the pointer to absolute screen coordinates.
    fn move_to(&mut self, x: i32, y: i32) -> Result<()>;

    /// Press and release `button` at the current position.
    fn click(&mut self, button: PointerButton) -> Result<()>;

    /// Size of the main display in pixels.
    fn display_size(&mut self) -> Result<(i32, i32)>;
}

/// [`Actuator`] backed by Enigo. The connection is opened on first use, so
/// constructing one is cheap and never fails.
#[derive(Default)]
pub struct EnigoActuator {
    enigo: Option<Enigo>,
}

impl EnigoActuator {
    pub fn new() -> Self {
        Self { enigo: None }
    }

    fn ensure_enigo(&mut self) -> Result<&mut Enigo> {
        if self.enigo.is_none() {
            trace!(target: "ghostclick::actuator", "Initializing Enigo");
            self.enigo = Some(Enigo::new(&Settings::default())?);
        }
        self.enigo
            .as_mut()
            .ok_or_else(|| Error::Actuation("Enigo connection unavailable".into()))
    }
}

impl Actuator for EnigoActuator {
    fn location(&mut self) -> Result<(i32, i32)> {
        let enigo = self.ensure_enigo()?;
        Ok(enigo.location()?)
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<()> {
        let enigo = self.ensure_enigo()?;
        trace!(target: "ghostclick::actuator", x, y, "move_to");
        enigo.move_mouse(x, y, Coordinate::Abs)?;
        Ok(())
    }

    fn click(&mut self, button: PointerButton) -> Result<()> {
        let enigo = self.ensure_enigo()?;
        trace!(target: "ghostclick::actuator", ?button, "click");
        enigo.button(map_mouse_button(button), Direction::Click)?;
        Ok(())
    }

    fn display_size(&mut self) -> Result<(i32, i32)> {
        let enigo = self.ensure_enigo()?;
        Ok(enigo.main_display()?)
    }
}

fn map_mouse_button(btn: PointerButton) -> EButton {
    match btn {
        PointerButton::Left => EButton::Left,
        PointerButton::Middle => EButton::Middle,
        PointerButton::Right => EButton::Right,
    }
}
