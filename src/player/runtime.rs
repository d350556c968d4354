use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::error::{Error, Result};
use crate::player::actuator::{Actuator, PointerButton};
use crate::player::config::PlaybackConfig;
use crate::script::{Action, ActionKind, Script};
use crate::utils::glide::Glide;
use crate::utils::timing::cancellable_sleep;

type StepCallback = Arc<dyn Fn(usize) + Send + Sync>;
type DoneCallback = Arc<dyn Fn() + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone, Default)]
struct Callbacks {
    step_change: Option<StepCallback>,
    done: Option<DoneCallback>,
    error: Option<ErrorCallback>,
}

/// How a playback run ended.
#[derive(Debug)]
pub enum PlaybackOutcome {
    /// Every iteration ran to the end.
    Completed,
    /// `stop()` was observed at a check point.
    Stopped,
    /// An actuation error (or a safety abort) ended the run.
    Failed(Error),
}

impl PlaybackOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PlaybackOutcome::Completed)
    }
}

struct Shared {
    running: AtomicBool,
    current_step: AtomicIsize,
}

/// Player drives one script at a time on a background Tokio task:
/// - waits each step's `delay_before` (scaled by the speed multiplier)
/// - actuates the step through the [`Actuator`] unless running dry
/// - reports progress, errors and completion through callbacks
///
/// `stop()` is cooperative: it is observed between steps and during waits, never
/// in the middle of an actuation.
pub struct Player {
    actuator: Arc<Mutex<Box<dyn Actuator>>>,
    config: Mutex<PlaybackConfig>,
    callbacks: RwLock<Callbacks>,
    shared: Arc<Shared>,
    cancel: Mutex<CancellationToken>,
}

impl Player {
    /// Create a player. Fails if `config` is out of range.
    pub fn new(actuator: Box<dyn Actuator>, config: PlaybackConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            actuator: Arc::new(Mutex::new(actuator)),
            config: Mutex::new(config),
            callbacks: RwLock::new(Callbacks::default()),
            shared: Arc::new(Shared {
                running: AtomicBool::new(false),
                current_step: AtomicIsize::new(-1),
            }),
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    pub fn config(&self) -> PlaybackConfig {
        self.config.lock().clone()
    }

    /// Replace the configuration used by the next run.
    pub fn set_config(&self, config: PlaybackConfig) -> Result<()> {
        config.validate()?;
        *self.config.lock() = config;
        Ok(())
    }

    /// Called with the step index before each step's wait.
    pub fn on_step_change(&self, f: impl Fn(usize) + Send + Sync + 'static) {
        self.callbacks.write().step_change = Some(Arc::new(f));
    }

    /// Called exactly once when a run exits, whatever the reason.
    pub fn on_playback_done(&self, f: impl Fn() + Send + Sync + 'static) {
        self.callbacks.write().done = Some(Arc::new(f));
    }

    /// Called with a message before `on_playback_done` when a run fails.
    pub fn on_error(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        self.callbacks.write().error = Some(Arc::new(f));
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Index of the step being played, or -1 when idle.
    pub fn current_step(&self) -> isize {
        self.shared.current_step.load(Ordering::SeqCst)
    }

    /// Start playing `script` in the background.
    ///
    /// Returns `None` (and does nothing) if a run is already in progress.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, script: Script, dry_run: bool) -> Option<JoinHandle<PlaybackOutcome>> {
        // Held until the new token is in place, so a concurrent stop() always
        // reaches the token of the run it observes as running.
        let mut cancel = self.cancel.lock();
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(target: "ghostclick::player", "start ignored: playback already running");
            return None;
        }
        self.shared.current_step.store(-1, Ordering::SeqCst);

        let token = CancellationToken::new();
        *cancel = token.clone();
        drop(cancel);

        let run = PlaybackRun {
            script,
            dry_run,
            config: self.config(),
            actuator: Arc::clone(&self.actuator),
            token,
            shared: Arc::clone(&self.shared),
            callbacks: self.callbacks.read().clone(),
        };

        info!(
            target: "ghostclick::player",
            name = %run.script.name,
            steps = run.script.len(),
            repeat_count = run.script.repeat_count,
            speed = run.config.speed_multiplier,
            dry_run,
            "Starting playback"
        );
        Some(tokio::spawn(run.execute()))
    }

    /// Request the current run to stop. Returns immediately.
    pub fn stop(&self) {
        if self.is_running() {
            debug!(target: "ghostclick::player", "Stop requested");
        }
        self.cancel.lock().cancel();
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.cancel.get_mut().cancel();
    }
}

/// Everything one run needs, moved into the playback task.
struct PlaybackRun {
    script: Script,
    dry_run: bool,
    config: PlaybackConfig,
    actuator: Arc<Mutex<Box<dyn Actuator>>>,
    token: CancellationToken,
    shared: Arc<Shared>,
    callbacks: Callbacks,
}

/// Puts the player back to idle when dropped, even if a callback panicked.
struct IdleOnDrop(Arc<Shared>);

impl Drop for IdleOnDrop {
    fn drop(&mut self) {
        self.0.current_step.store(-1, Ordering::SeqCst);
        self.0.running.store(false, Ordering::SeqCst);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl PlaybackRun {
    async fn execute(self) -> PlaybackOutcome {
        let idle = IdleOnDrop(Arc::clone(&self.shared));
        let callbacks = self.callbacks.clone();

        // Own task: a panicking step callback surfaces here as a JoinError.
        let outcome = match tokio::spawn(async move { self.play().await }).await {
            Ok(Ok(true)) => PlaybackOutcome::Completed,
            Ok(Ok(false)) => PlaybackOutcome::Stopped,
            Ok(Err(err)) => PlaybackOutcome::Failed(err),
            Err(join) if join.is_panic() => {
                let payload = join.into_panic();
                PlaybackOutcome::Failed(Error::Actuation(format!(
                    "playback panicked: {}",
                    panic_message(payload.as_ref())
                )))
            }
            Err(_) => PlaybackOutcome::Stopped,
        };

        match &outcome {
            PlaybackOutcome::Failed(err) => {
                error!(target: "ghostclick::player", error = %err, "Playback failed");
                if let Some(cb) = &callbacks.error {
                    cb(&err.to_string());
                }
            }
            PlaybackOutcome::Stopped => info!(target: "ghostclick::player", "Playback stopped"),
            PlaybackOutcome::Completed => info!(target: "ghostclick::player", "Playback completed"),
        }

        drop(idle);
        if let Some(cb) = &callbacks.done {
            cb();
        }
        outcome
    }

    /// Returns `Ok(true)` when all iterations ran, `Ok(false)` when stopped.
    async fn play(&self) -> Result<bool> {
        let steps = &self.script.steps;
        if steps.is_empty() {
            return Ok(true);
        }
        let repeat = self.script.repeat_count;
        let infinite = repeat == 0;
        let mut iteration: u32 = 0;

        while infinite || iteration < repeat {
            for (i, step) in steps.iter().enumerate() {
                if self.token.is_cancelled() {
                    return Ok(false);
                }

                self.shared.current_step.store(i as isize, Ordering::SeqCst);
                if let Some(cb) = &self.callbacks.step_change {
                    cb(i);
                }

                let wait = self.config.scaled_delay(step.delay_before);
                if !wait.is_zero() && !cancellable_sleep(wait, &self.token).await {
                    return Ok(false);
                }
                if self.token.is_cancelled() {
                    return Ok(false);
                }

                if self.dry_run {
                    info!(
                        target: "ghostclick::player",
                        step_index = i, kind = ?step.kind, x = step.x, y = step.y,
                        "DRY-RUN step"
                    );
                } else {
                    trace!(target: "ghostclick::player", iteration, step_index = i, "Executing step");
                    self.perform(step).await?;
                }
            }

            iteration = iteration.saturating_add(1);
            let more = infinite || iteration < repeat;
            if more {
                let pause = self.config.inter_iteration();
                if !pause.is_zero() && !cancellable_sleep(pause, &self.token).await {
                    return Ok(false);
                }
                // Keeps a zero-delay infinite loop from starving the runtime.
                tokio::task::yield_now().await;
            }
        }
        Ok(true)
    }

    async fn perform(&self, step: &Action) -> Result<()> {
        let origin = self.with_actuator(|a| a.location())?;
        let target = (step.x, step.y);

        if step.move_to_first {
            self.glide(origin, target).await?;
        }

        match step.kind {
            ActionKind::Move => self.move_to(target)?,
            ActionKind::LeftClick => {
                self.move_to(target)?;
                self.click(PointerButton::Left)?;
            }
            ActionKind::RightClick => {
                self.move_to(target)?;
                self.click(PointerButton::Right)?;
            }
            ActionKind::DoubleClick => {
                self.move_to(target)?;
                self.click(PointerButton::Left)?;
                self.click(PointerButton::Left)?;
            }
        }

        if step.return_cursor {
            self.glide(target, origin).await?;
        }
        Ok(())
    }

    async fn glide(&self, from: (i32, i32), to: (i32, i32)) -> Result<()> {
        let glide = Glide::new(from, to, self.config.glide);
        let interval = glide.step_interval();
        for point in glide.points() {
            if !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
            self.move_to(point)?;
        }
        Ok(())
    }

    fn move_to(&self, (x, y): (i32, i32)) -> Result<()> {
        self.with_actuator(|a| a.move_to(x, y))
    }

    fn click(&self, button: PointerButton) -> Result<()> {
        self.with_actuator(|a| a.click(button))
    }

    /// Run one actuation after checking the safety zone.
    fn with_actuator<T>(&self, op: impl FnOnce(&mut dyn Actuator) -> Result<T>) -> Result<T> {
        let mut guard = self.actuator.lock();
        let actuator: &mut dyn Actuator = &mut **guard;
        let safety = &self.config.safety;
        if safety.enabled {
            let pos = actuator.location()?;
            let display = if safety.needs_display_size() {
                Some(actuator.display_size()?)
            } else {
                None
            };
            if safety.contains(pos, display) {
                return Err(Error::SafetyAbort { x: pos.0, y: pos.1 });
            }
        }
        op(actuator)
    }
}
