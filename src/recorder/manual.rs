use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::Sender;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use super::{InputHook, RawEvent};
use crate::error::{Error, Result};

/// Hook fed by the caller.
///
/// Clones share the same attachment, so one clone can be handed to a
/// [`Recorder`](super::Recorder) while another injects events.
#[derive(Debug, Clone, Default)]
pub struct ManualHook {
    sender: Arc<Mutex<Option<Sender<RawEvent>>>>,
    refuse: Option<String>,
}

impl ManualHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// A hook whose `attach` always fails with `reason`.
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            refuse: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn is_attached(&self) -> bool {
        self.sender.lock().is_some()
    }

    /// Deliver an event, waiting for channel capacity. Returns false when not attached.
    pub async fn send(&self, event: RawEvent) -> bool {
        let sender = self.sender.lock().clone();
        match sender {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Deliver an event without waiting; dropped (and logged) when the channel is full.
    pub fn try_send(&self, event: RawEvent) -> bool {
        let guard = self.sender.lock();
        let Some(tx) = guard.as_ref() else {
            return false;
        };
        match tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(target: "ghostclick::hook", "Event channel full; dropping raw event");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

impl InputHook for ManualHook {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn attach(&mut self, sender: Sender<RawEvent>) -> Result<()> {
        if let Some(reason) = &self.refuse {
            return Err(Error::InputHook(reason.clone()));
        }
        *self.sender.lock() = Some(sender);
        debug!(target: "ghostclick::hook", "ManualHook attached");
        Ok(())
    }

    fn detach(&mut self) {
        self.sender.lock().take();
    }
}
