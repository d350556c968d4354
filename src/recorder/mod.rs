/*!
Recorder module (input hooks and classification).

This module defines the raw event model, the `InputHook` trait and the
`Recorder` session. Concrete hooks live in their own files:

- `manual.rs`       -> `ManualHook`  (events injected by the caller; scripted input and tests)
- `stdin_source.rs` -> `StdinHook`   (newline-delimited JSON raw events from standard input)
- `rdev_hook.rs`    -> `RdevHook`    (global OS hook, behind the `rdev` cargo feature)

Each hook is responsible for:
- Stamping events with the time they were observed
- Pushing them into the provided bounded `Sender<RawEvent>`
- Failing `attach` with `Error::InputHook` when it cannot listen
- Never panicking inside its delivery thread/task
*/

use tokio::sync::mpsc::Sender;
use tokio::time::Instant;

use crate::error::Result;
use crate::player::PointerButton;

pub mod classifier;
pub mod manual;
#[cfg(feature = "rdev")]
pub mod rdev_hook;
pub mod session;
pub mod stdin_source;

pub use classifier::{Classifier, RecorderConfig};
pub use manual::ManualHook;
#[cfg(feature = "rdev")]
pub use rdev_hook::RdevHook;
pub use session::Recorder;
pub use stdin_source::StdinHook;

/// What happened in a raw pointer event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RawEventKind {
    Move,
    Press(PointerButton),
    Release(PointerButton),
}

/// One pointer event as delivered by an input hook.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: RawEventKind,
    pub x: i32,
    pub y: i32,
    /// When the hook observed the event.
    pub at: Instant,
}

impl RawEvent {
    pub fn new(kind: RawEventKind, x: i32, y: i32, at: Instant) -> Self {
        Self { kind, x, y, at }
    }

    pub fn moved(x: i32, y: i32, at: Instant) -> Self {
        Self::new(RawEventKind::Move, x, y, at)
    }

    pub fn press(button: PointerButton, x: i32, y: i32, at: Instant) -> Self {
        Self::new(RawEventKind::Press(button), x, y, at)
    }

    pub fn release(button: PointerButton, x: i32, y: i32, at: Instant) -> Self {
        Self::new(RawEventKind::Release(button), x, y, at)
    }
}

/// Source of raw pointer events for the [`Recorder`].
///
/// `attach` is called by `Recorder::start` and must either start delivering
/// events into `sender` or fail; `detach` is called by `Recorder::stop`.
pub trait InputHook: Send {
    /// Static human-readable identifier (used in logs).
    fn name(&self) -> &'static str;

    /// Begin delivering events. Fails with `Error::InputHook` if listening is impossible.
    fn attach(&mut self, sender: Sender<RawEvent>) -> Result<()>;

    /// Stop delivering events. Must be safe to call when not attached.
    fn detach(&mut self);
}
