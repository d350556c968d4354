use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use super::{RawEvent, RawEventKind};
use crate::player::PointerButton;
use crate::script::{Action, ActionKind};
use crate::utils::timing::round_to_millis;

/// Recorder thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfig {
    /// A second left press within this window turns the first into a double click.
    pub double_click_window: Duration,
    /// Minimum time between two accepted move samples.
    pub move_min_interval: Duration,
    /// Minimum displacement (on either axis) between two accepted move samples.
    pub move_min_distance: i32,
    /// Capacity of the hook-to-classifier channel.
    pub channel_capacity: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            double_click_window: Duration::from_millis(250),
            move_min_interval: Duration::from_millis(50),
            move_min_distance: 5,
            channel_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingClick {
    x: i32,
    y: i32,
    delay: f64,
    deadline: Instant,
}

#[derive(Debug, Clone, Copy)]
struct MoveSample {
    x: i32,
    y: i32,
    at: Instant,
}

/// Turns raw pointer events into actions.
///
/// The classifier is a plain state machine: it never reads the clock itself.
/// Event timestamps drive delays, and the owner calls [`Classifier::on_deadline`]
/// once [`Classifier::pending_deadline`] has passed to settle a buffered left click.
#[derive(Debug, Clone)]
pub struct Classifier {
    config: RecorderConfig,
    record_movements: bool,
    last_event: Option<Instant>,
    pending: Option<PendingClick>,
    last_move: Option<MoveSample>,
}

impl Classifier {
    pub fn new(config: RecorderConfig, record_movements: bool) -> Self {
        Self {
            config,
            record_movements,
            last_event: None,
            pending: None,
            last_move: None,
        }
    }

    /// When the buffered left click, if any, settles as a single click.
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed one raw event; returns the actions it finalizes, in order.
    pub fn handle(&mut self, event: &RawEvent) -> Vec<Action> {
        let mut out = Vec::new();
        match event.kind {
            RawEventKind::Release(_) | RawEventKind::Press(PointerButton::Middle) => {}
            RawEventKind::Move => {
                if !self.record_movements || !self.accept_move(event) {
                    return out;
                }
                self.flush_expired(event.at, &mut out);
                let delay = self.take_delay(event.at);
                self.sample(event);
                out.push(Action::new(ActionKind::Move, event.x, event.y, delay));
            }
            RawEventKind::Press(PointerButton::Left) => {
                self.flush_expired(event.at, &mut out);
                let delay = self.take_delay(event.at);
                self.sample(event);
                match self.pending.take() {
                    Some(first) => {
                        trace!(target: "ghostclick::recorder", x = first.x, y = first.y, "Double click");
                        out.push(Action::new(
                            ActionKind::DoubleClick,
                            first.x,
                            first.y,
                            first.delay,
                        ));
                    }
                    None => {
                        self.pending = Some(PendingClick {
                            x: event.x,
                            y: event.y,
                            delay,
                            deadline: event.at + self.config.double_click_window,
                        });
                    }
                }
            }
            RawEventKind::Press(PointerButton::Right) => {
                self.flush_expired(event.at, &mut out);
                let delay = self.take_delay(event.at);
                self.sample(event);
                if let Some(first) = self.pending.take() {
                    out.push(Self::single_click(first));
                }
                out.push(Action::new(ActionKind::RightClick, event.x, event.y, delay));
            }
        }
        out
    }

    /// Settle the buffered left click if its deadline is at or before `now`.
    pub fn on_deadline(&mut self, now: Instant) -> Option<Action> {
        match self.pending {
            Some(p) if now >= p.deadline => {
                self.pending = None;
                Some(Self::single_click(p))
            }
            _ => None,
        }
    }

    /// Settle the buffered left click now, whatever its deadline. Used once no
    /// further press can arrive.
    pub fn flush_pending(&mut self) -> Option<Action> {
        self.pending.take().map(Self::single_click)
    }

    /// Drop the buffered left click without committing it. Returns true if one was pending.
    pub fn discard_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }

    fn single_click(p: PendingClick) -> Action {
        Action::new(ActionKind::LeftClick, p.x, p.y, p.delay)
    }

    fn flush_expired(&mut self, at: Instant, out: &mut Vec<Action>) {
        if let Some(action) = self.on_deadline(at) {
            out.push(action);
        }
    }

    /// Seconds since the previous processed event; 0 for the first one.
    fn take_delay(&mut self, at: Instant) -> f64 {
        let delay = match self.last_event {
            Some(prev) => round_to_millis(at.saturating_duration_since(prev)),
            None => 0.0,
        };
        self.last_event = Some(at);
        delay
    }

    fn accept_move(&self, event: &RawEvent) -> bool {
        match self.last_move {
            None => true,
            Some(last) => {
                let elapsed = event.at.saturating_duration_since(last.at);
                let dx = (event.x - last.x).abs();
                let dy = (event.y - last.y).abs();
                elapsed >= self.config.move_min_interval
                    && (dx >= self.config.move_min_distance || dy >= self.config.move_min_distance)
            }
        }
    }

    fn sample(&mut self, event: &RawEvent) {
        self.last_move = Some(MoveSample {
            x: event.x,
            y: event.y,
            at: event.at,
        });
    }
}
