use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::classifier::{Classifier, RecorderConfig};
use super::{InputHook, RawEvent};
use crate::error::{Error, Result};
use crate::script::Action;

type CapturedCallback = Arc<dyn Fn(&Action) + Send + Sync>;

/// Committed actions of the current session. `open` is false once `stop()` drained it.
#[derive(Default)]
struct CaptureBuffer {
    open: bool,
    entries: Vec<Action>,
}

struct Session {
    token: CancellationToken,
    /// Cancelled by the classification task when the hook closes its channel.
    input_closed: CancellationToken,
    task: JoinHandle<()>,
}

/// Records pointer activity from an [`InputHook`] into a list of actions.
///
/// Raw events travel through a bounded channel into one classification task,
/// which owns the pending click and its deadline. `stop()` waits for that task
/// to classify everything already delivered before it drains the commit buffer,
/// so the returned list is complete.
pub struct Recorder {
    hook: Mutex<Box<dyn InputHook>>,
    config: RecorderConfig,
    buffer: Arc<Mutex<CaptureBuffer>>,
    on_captured: RwLock<Option<CapturedCallback>>,
    session: Mutex<Option<Session>>,
}

impl Recorder {
    pub fn new(hook: Box<dyn InputHook>) -> Self {
        Self::with_config(hook, RecorderConfig::default())
    }

    pub fn with_config(hook: Box<dyn InputHook>, config: RecorderConfig) -> Self {
        Self {
            hook: Mutex::new(hook),
            config,
            buffer: Arc::new(Mutex::new(CaptureBuffer::default())),
            on_captured: RwLock::new(None),
            session: Mutex::new(None),
        }
    }

    /// Called from the classification task for every finalized action.
    pub fn on_action_captured(&self, f: impl Fn(&Action) + Send + Sync + 'static) {
        *self.on_captured.write() = Some(Arc::new(f));
    }

    pub fn is_recording(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Snapshot of the actions committed so far in the current session.
    pub fn entries(&self) -> Vec<Action> {
        self.buffer.lock().entries.clone()
    }

    /// Begin recording. Returns `Ok(false)` if already recording.
    ///
    /// Fails with [`Error::InputHook`] when called outside a Tokio runtime or
    /// when the hook cannot attach; recording does not begin.
    pub fn start(&self, record_movements: bool) -> Result<bool> {
        let mut session = self.session.lock();
        if session.is_some() {
            debug!(target: "ghostclick::recorder", "start ignored: already recording");
            return Ok(false);
        }

        let runtime = Handle::try_current()
            .map_err(|e| Error::InputHook(format!("recording needs a Tokio runtime: {e}")))?;

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        {
            let mut hook = self.hook.lock();
            let name = hook.name();
            hook.attach(tx).map_err(|err| match err {
                Error::InputHook(_) => err,
                other => Error::InputHook(other.to_string()),
            })?;
            info!(target: "ghostclick::recorder", hook = name, record_movements, "Recording started");
        }

        {
            let mut buffer = self.buffer.lock();
            buffer.entries.clear();
            buffer.open = true;
        }

        let token = CancellationToken::new();
        let input_closed = CancellationToken::new();
        let task = ClassifyTask {
            events: rx,
            classifier: Classifier::new(self.config.clone(), record_movements),
            buffer: Arc::clone(&self.buffer),
            on_captured: self.on_captured.read().clone(),
            token: token.clone(),
            input_closed: input_closed.clone(),
        };
        let task = runtime.spawn(task.run());

        *session = Some(Session {
            token,
            input_closed,
            task,
        });
        Ok(true)
    }

    /// Resolves once the hook has closed its channel (e.g. EOF on stdin).
    /// Returns immediately when not recording.
    pub async fn wait_input_closed(&self) {
        let closed = self
            .session
            .lock()
            .as_ref()
            .map(|s| s.input_closed.clone());
        if let Some(closed) = closed {
            closed.cancelled_owned().await;
        }
    }

    /// End recording and return the committed actions in order.
    ///
    /// Events the hook delivered before this call are classified first. A left
    /// click still waiting for a possible second press is then discarded.
    /// Returns an empty list when not recording.
    pub async fn stop(&self) -> Vec<Action> {
        let session = self.session.lock().take();
        let Some(session) = session else {
            return Vec::new();
        };
        session.token.cancel();
        self.hook.lock().detach();
        if let Err(err) = session.task.await {
            warn!(target: "ghostclick::recorder", error = %err, "Classification task ended abnormally");
        }

        let captured = {
            let mut buffer = self.buffer.lock();
            buffer.open = false;
            std::mem::take(&mut buffer.entries)
        };
        info!(target: "ghostclick::recorder", actions = captured.len(), "Recording stopped");
        captured
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.token.cancel();
            self.hook.get_mut().detach();
        }
    }
}

struct ClassifyTask {
    events: Receiver<RawEvent>,
    classifier: Classifier,
    buffer: Arc<Mutex<CaptureBuffer>>,
    on_captured: Option<CapturedCallback>,
    token: CancellationToken,
    input_closed: CancellationToken,
}

impl ClassifyTask {
    async fn run(mut self) {
        loop {
            let deadline = self.classifier.pending_deadline();
            tokio::select! {
                biased;
                _ = self.token.cancelled() => {
                    self.drain_delivered();
                    break;
                }
                event = self.events.recv() => match event {
                    Some(event) => {
                        let actions = self.classifier.handle(&event);
                        self.commit(actions);
                    }
                    None => {
                        // No second press can follow any more.
                        if let Some(action) = self.classifier.flush_pending() {
                            self.commit(vec![action]);
                        }
                        info!(target: "ghostclick::recorder", "Input hook closed its channel");
                        self.input_closed.cancel();
                        break;
                    }
                },
                _ = wait_until(deadline) => {
                    if let Some(action) = self.classifier.on_deadline(Instant::now()) {
                        self.commit(vec![action]);
                    }
                }
            }
        }
        if self.classifier.discard_pending() {
            debug!(target: "ghostclick::recorder", "Discarded undecided click at stop");
        }
    }

    /// Classify whatever is still queued once stop was requested.
    fn drain_delivered(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            let actions = self.classifier.handle(&event);
            self.commit(actions);
        }
        if let Some(action) = self.classifier.on_deadline(Instant::now()) {
            self.commit(vec![action]);
        }
    }

    fn commit(&self, actions: Vec<Action>) {
        if actions.is_empty() {
            return;
        }
        {
            let mut buffer = self.buffer.lock();
            if !buffer.open {
                return;
            }
            buffer.entries.extend(actions.iter().cloned());
        }
        for action in &actions {
            debug!(target: "ghostclick::recorder", action = %action.describe(), "Captured");
            if let Some(cb) = &self.on_captured {
                cb(action);
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PointerButton;
    use crate::recorder::{ManualHook, StdinHook};
    use crate::script::ActionKind;
    use std::time::Duration;
    use tokio::time::sleep;

    fn recorder() -> (Recorder, ManualHook) {
        let hook = ManualHook::new();
        (Recorder::new(Box::new(hook.clone())), hook)
    }

    async fn press(hook: &ManualHook, button: PointerButton, x: i32, y: i32) {
        assert!(hook.send(RawEvent::press(button, x, y, Instant::now())).await);
    }

    #[tokio::test(start_paused = true)]
    async fn quick_double_press_is_one_double_click() {
        let (rec, hook) = recorder();
        assert!(rec.start(false).unwrap());

        sleep(Duration::from_millis(700)).await;
        press(&hook, PointerButton::Left, 40, 40).await;
        sleep(Duration::from_millis(120)).await;
        press(&hook, PointerButton::Left, 41, 41).await;

        let actions = rec.stop().await;
        assert_eq!(actions, vec![Action::new(ActionKind::DoubleClick, 40, 40, 0.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_presses_are_two_left_clicks() {
        let (rec, hook) = recorder();
        rec.start(false).unwrap();

        press(&hook, PointerButton::Left, 10, 10).await;
        sleep(Duration::from_millis(300)).await;
        assert_eq!(rec.entries().len(), 1);
        press(&hook, PointerButton::Left, 10, 10).await;
        sleep(Duration::from_millis(300)).await;

        assert_eq!(
            rec.stop().await,
            vec![
                Action::new(ActionKind::LeftClick, 10, 10, 0.0),
                Action::new(ActionKind::LeftClick, 10, 10, 0.3),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_keeps_events_delivered_just_before_it() {
        let (rec, hook) = recorder();
        rec.start(false).unwrap();
        press(&hook, PointerButton::Right, 7, 7).await;
        assert_eq!(
            rec.stop().await,
            vec![Action::new(ActionKind::RightClick, 7, 7, 0.0)]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_drains_a_full_burst() {
        let (rec, hook) = recorder();
        rec.start(false).unwrap();
        for i in 0..100 {
            press(&hook, PointerButton::Right, i, i).await;
        }
        let actions = rec.stop().await;
        assert_eq!(actions.len(), 100);
        assert_eq!((actions[99].x, actions[99].y), (99, 99));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_commits_click_whose_window_already_elapsed() {
        let (rec, hook) = recorder();
        rec.start(false).unwrap();
        let t0 = Instant::now() - Duration::from_millis(400);
        assert!(hook.send(RawEvent::press(PointerButton::Left, 3, 3, t0)).await);
        assert_eq!(
            rec.stop().await,
            vec![Action::new(ActionKind::LeftClick, 3, 3, 0.0)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_undecided_click() {
        let (rec, hook) = recorder();
        let captured = Arc::new(Mutex::new(Vec::new()));
        let c = Arc::clone(&captured);
        rec.on_action_captured(move |a| c.lock().push(a.clone()));
        rec.start(false).unwrap();

        press(&hook, PointerButton::Right, 5, 5).await;
        sleep(Duration::from_millis(500)).await;
        press(&hook, PointerButton::Left, 9, 9).await;

        let actions = rec.stop().await;
        assert_eq!(actions, vec![Action::new(ActionKind::RightClick, 5, 5, 0.0)]);
        assert_eq!(*captured.lock(), actions);

        // The discarded click never shows up later either.
        sleep(Duration::from_millis(500)).await;
        assert_eq!(captured.lock().len(), 1);
        assert!(!hook.is_attached());
    }

    #[tokio::test(start_paused = true)]
    async fn moves_are_throttled_and_first_delay_is_zero() {
        let (rec, hook) = recorder();
        rec.start(true).unwrap();
        sleep(Duration::from_secs(3)).await;

        let t0 = Instant::now();
        let burst = [(100, 100, 0), (300, 300, 20), (103, 98, 80), (96, 104, 400)];
        for (x, y, offset) in burst {
            let ev = RawEvent::moved(x, y, t0 + Duration::from_millis(offset));
            assert!(hook.send(ev).await);
        }

        let actions = rec.stop().await;
        assert_eq!(actions, vec![Action::new(ActionKind::Move, 100, 100, 0.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn right_press_flushes_pending_left_in_order() {
        let (rec, hook) = recorder();
        rec.start(false).unwrap();
        press(&hook, PointerButton::Left, 1, 2).await;
        sleep(Duration::from_millis(100)).await;
        press(&hook, PointerButton::Right, 3, 4).await;
        assert_eq!(
            rec.stop().await,
            vec![
                Action::new(ActionKind::LeftClick, 1, 2, 0.0),
                Action::new(ActionKind::RightClick, 3, 4, 0.1),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn each_session_starts_fresh() {
        let (rec, hook) = recorder();
        rec.start(false).unwrap();
        assert!(!rec.start(true).unwrap(), "second start is a no-op");
        press(&hook, PointerButton::Right, 1, 1).await;
        assert_eq!(rec.stop().await.len(), 1);
        assert!(rec.stop().await.is_empty());

        sleep(Duration::from_secs(10)).await;
        rec.start(false).unwrap();
        press(&hook, PointerButton::Right, 2, 2).await;
        let second = rec.stop().await;
        assert_eq!(second, vec![Action::new(ActionKind::RightClick, 2, 2, 0.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_ndjson_log_keeps_its_spacing() {
        let log: &'static [u8] = b"{\"event\":\"press\",\"button\":\"left\",\"x\":10,\"y\":10,\"at_ms\":0}\n\
{\"event\":\"release\",\"button\":\"left\",\"x\":10,\"y\":10,\"at_ms\":80}\n\
{\"event\":\"press\",\"button\":\"left\",\"x\":10,\"y\":10,\"at_ms\":400}\n";
        let rec = Recorder::new(Box::new(StdinHook::from_reader(log)));
        rec.start(false).unwrap();
        rec.wait_input_closed().await;

        assert_eq!(
            rec.stop().await,
            vec![
                Action::new(ActionKind::LeftClick, 10, 10, 0.0),
                Action::new(ActionKind::LeftClick, 10, 10, 0.4),
            ]
        );
    }

    #[tokio::test]
    async fn hook_failure_fails_start() {
        let rec = Recorder::new(Box::new(ManualHook::refusing("permission denied")));
        let err = rec.start(false).unwrap_err();
        assert!(matches!(err, Error::InputHook(_)));
        assert!(!rec.is_recording());
        assert!(rec.stop().await.is_empty());
    }

    #[test]
    fn start_outside_runtime_fails_without_attaching() {
        let (rec, hook) = recorder();
        assert!(matches!(rec.start(false), Err(Error::InputHook(_))));
        assert!(!hook.is_attached());
        assert!(!rec.is_recording());
    }

    #[tokio::test]
    async fn stop_without_start_is_empty() {
        let (rec, _hook) = recorder();
        assert!(!rec.is_recording());
        assert!(rec.stop().await.is_empty());
        rec.wait_input_closed().await;
    }
}
