//! Global OS input hook built on `rdev`.
//!
//! `rdev::listen` blocks its thread for the life of the process and cannot be
//! torn down, so one listener thread is started on first attach and every
//! `RdevHook` shares it through a process-wide sender slot. Detaching just
//! empties the slot.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use rdev::{Button, Event, EventType, listen};
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::{InputHook, RawEvent, RawEventKind};
use crate::error::{Error, Result};
use crate::player::PointerButton;

/// How long `attach` waits for the listener to report a start-up failure.
const STARTUP_GRACE: Duration = Duration::from_millis(200);

type Slot = Arc<Mutex<Option<Sender<RawEvent>>>>;

struct Listener {
    slot: Slot,
    /// Start-up failure reported by `rdev::listen`, if any.
    failure: Option<String>,
}

static LISTENER: OnceLock<Listener> = OnceLock::new();

fn listener() -> &'static Listener {
    LISTENER.get_or_init(|| {
        let slot: Slot = Arc::default();
        let (ready_tx, ready_rx) = std_mpsc::channel::<String>();

        let thread_slot = Arc::clone(&slot);
        let spawned = std::thread::Builder::new()
            .name("ghostclick-rdev".into())
            .spawn(move || {
                let mut last = (0, 0);
                let callback = move |event: Event| {
                    if let Some(raw) = translate(&event, &mut last) {
                        forward(&thread_slot, raw);
                    }
                };
                info!(target: "ghostclick::hook", "rdev listener thread started");
                if let Err(e) = listen(callback) {
                    let _ = ready_tx.send(format!("{e:?}"));
                }
            });

        let failure = match spawned {
            Ok(_) => ready_rx.recv_timeout(STARTUP_GRACE).ok(),
            Err(e) => Some(format!("cannot spawn listener thread: {e}")),
        };
        if let Some(reason) = &failure {
            error!(target: "ghostclick::hook", %reason, "rdev listener failed");
        }
        Listener { slot, failure }
    })
}

fn translate(event: &Event, last: &mut (i32, i32)) -> Option<RawEvent> {
    let at = Instant::now();
    let kind = match event.event_type {
        EventType::MouseMove { x, y } => {
            *last = (x as i32, y as i32);
            RawEventKind::Move
        }
        EventType::ButtonPress(button) => RawEventKind::Press(map_button(button)?),
        EventType::ButtonRelease(button) => RawEventKind::Release(map_button(button)?),
        _ => return None,
    };
    Some(RawEvent::new(kind, last.0, last.1, at))
}

fn map_button(button: Button) -> Option<PointerButton> {
    match button {
        Button::Left => Some(PointerButton::Left),
        Button::Right => Some(PointerButton::Right),
        Button::Middle => Some(PointerButton::Middle),
        Button::Unknown(_) => None,
    }
}

fn forward(slot: &Slot, event: RawEvent) {
    let guard = slot.lock();
    if let Some(tx) = guard.as_ref() {
        if let Err(TrySendError::Full(_)) = tx.try_send(event) {
            warn!(target: "ghostclick::hook", "Event channel full; dropping OS event");
        }
    }
}

/// Hook that listens to the global OS pointer stream.
#[derive(Debug, Default)]
pub struct RdevHook {
    attached: bool,
}

impl RdevHook {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputHook for RdevHook {
    fn name(&self) -> &'static str {
        "rdev"
    }

    fn attach(&mut self, sender: Sender<RawEvent>) -> Result<()> {
        let listener = listener();
        if let Some(reason) = &listener.failure {
            return Err(Error::InputHook(reason.clone()));
        }
        *listener.slot.lock() = Some(sender);
        self.attached = true;
        debug!(target: "ghostclick::hook", "RdevHook attached");
        Ok(())
    }

    fn detach(&mut self) {
        if std::mem::take(&mut self.attached) {
            if let Some(listener) = LISTENER.get() {
                listener.slot.lock().take();
            }
            debug!(target: "ghostclick::hook", "RdevHook detached");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn event(event_type: EventType) -> Event {
        Event {
            time: SystemTime::now(),
            name: None,
            event_type,
        }
    }

    #[test]
    fn presses_carry_last_pointer_position() {
        let mut last = (0, 0);
        let moved = translate(&event(EventType::MouseMove { x: 12.7, y: 40.2 }), &mut last).unwrap();
        assert_eq!((moved.kind, moved.x, moved.y), (RawEventKind::Move, 12, 40));

        let press = translate(&event(EventType::ButtonPress(Button::Right)), &mut last).unwrap();
        assert_eq!(press.kind, RawEventKind::Press(PointerButton::Right));
        assert_eq!((press.x, press.y), (12, 40));

        assert!(translate(&event(EventType::ButtonPress(Button::Unknown(8))), &mut last).is_none());
        assert!(translate(&event(EventType::Wheel { delta_x: 0, delta_y: 1 }), &mut last).is_none());
    }
}
