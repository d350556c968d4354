//! Stdin input hook.
//!
//! Reads newline-delimited JSON raw pointer events from standard input (NDJSON style),
//! one event per line:
//!
//! ```text
//! {"event":"move","x":120,"y":48}
//! {"event":"press","button":"left","x":120,"y":48,"at_ms":0}
//! {"event":"release","button":"left","x":120,"y":48,"at_ms":90}
//! ```
//!
//! Behavior:
//! - `at_ms` is an optional offset from the moment the hook attached. Lines without
//!   it are stamped with the time they were read.
//! - Malformed lines are logged with `warn!` and ignored; reading continues.
//! - EOF, `detach`, or a closed channel (recorder stopped) terminates the task.
//!   On EOF the recorder settles the last click, since no second press can follow.
//!
//! With `at_ms` on every line a captured event log replays with its original spacing:
//!     cat clicks.ndjson | ghostclick record out.ghostclick --from-stdin

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use tokio::{
    io::{self, AsyncBufReadExt, AsyncRead, BufReader},
    sync::mpsc::Sender,
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info, trace, warn};

use super::{InputHook, RawEvent, RawEventKind};
use crate::error::{Error, Result};
use crate::player::PointerButton;

type BoxedInput = Box<dyn AsyncRead + Send + Unpin>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WireKind {
    Move,
    Press,
    Release,
}

/// One NDJSON line.
#[derive(Debug, Deserialize)]
struct WireEvent {
    event: WireKind,
    #[serde(default)]
    button: Option<PointerButton>,
    x: i32,
    y: i32,
    /// Milliseconds after the hook attached.
    #[serde(default)]
    at_ms: Option<u64>,
}

impl WireEvent {
    fn into_raw(self, anchor: Instant, received: Instant) -> std::result::Result<RawEvent, String> {
        let kind = match (self.event, self.button) {
            (WireKind::Move, _) => RawEventKind::Move,
            (WireKind::Press, Some(b)) => RawEventKind::Press(b),
            (WireKind::Release, Some(b)) => RawEventKind::Release(b),
            (_, None) => return Err("press/release events need a `button`".into()),
        };
        let at = match self.at_ms {
            Some(ms) => anchor
                .checked_add(Duration::from_millis(ms))
                .ok_or_else(|| format!("at_ms {ms} is out of range"))?,
            None => received,
        };
        Ok(RawEvent::new(kind, self.x, self.y, at))
    }
}

/// Parse one line. `anchor` is where `at_ms` counts from, `received` stamps untimed lines.
fn parse_line(
    line: &str,
    anchor: Instant,
    received: Instant,
) -> std::result::Result<RawEvent, String> {
    let wire: WireEvent = serde_json::from_str(line).map_err(|e| e.to_string())?;
    wire.into_raw(anchor, received)
}

enum Input {
    Stdin,
    /// A caller-supplied reader; taken by the first attach.
    Reader(Option<BoxedInput>),
}

/// Hook that reads newline-delimited JSON pointer events from stdin, or from
/// any reader handed to [`StdinHook::from_reader`].
pub struct StdinHook {
    input: Input,
    task: Option<JoinHandle<()>>,
}

impl StdinHook {
    /// Construct a new `StdinHook`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: Input::Stdin,
            task: None,
        }
    }

    /// Read events from `reader` instead of stdin (a log file, a socket, a test buffer).
    #[must_use]
    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            input: Input::Reader(Some(Box::new(reader))),
            task: None,
        }
    }
}

impl Default for StdinHook {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdinHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let input = match self.input {
            Input::Stdin => "stdin",
            Input::Reader(_) => "reader",
        };
        f.debug_struct("StdinHook")
            .field("input", &input)
            .field("attached", &self.task.is_some())
            .finish()
    }
}

impl InputHook for StdinHook {
    fn name(&self) -> &'static str {
        "stdin"
    }

    fn attach(&mut self, sender: Sender<RawEvent>) -> Result<()> {
        if self.task.is_some() {
            return Err(Error::InputHook("stdin hook is already attached".into()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::InputHook(format!("stdin hook needs a Tokio runtime: {e}")))?;
        let input: BoxedInput = match &mut self.input {
            Input::Stdin => Box::new(io::stdin()),
            Input::Reader(reader) => reader
                .take()
                .ok_or_else(|| Error::InputHook("the supplied reader was already consumed".into()))?,
        };
        self.task = Some(runtime.spawn(pump_lines(input, sender, Instant::now())));
        Ok(())
    }

    fn detach(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!(target: "ghostclick::hook", "StdinHook detached");
        }
    }
}

/// Forward each parsed line of `input` into `sender` until EOF or the channel closes.
async fn pump_lines<R: AsyncRead + Unpin>(input: R, sender: Sender<RawEvent>, anchor: Instant) {
    info!(target: "ghostclick::hook", "StdinHook task started (reading lines)");
    let mut reader = BufReader::new(input);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!(target: "ghostclick::hook", "EOF on input; StdinHook exiting");
                break;
            }
            Ok(_) => {
                let raw = line.trim();
                if raw.is_empty() {
                    continue;
                }
                match parse_line(raw, anchor, Instant::now()) {
                    Ok(event) => {
                        trace!(target: "ghostclick::hook", ?event, "Parsed raw event from stdin");
                        if sender.send(event).await.is_err() {
                            debug!(target: "ghostclick::hook", "Recorder closed; StdinHook exiting");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(
                            target: "ghostclick::hook",
                            error = %e,
                            line = raw,
                            "Failed to parse stdin event line"
                        );
                    }
                }
            }
            Err(e) => {
                warn!(
                    target: "ghostclick::hook",
                    error = %e,
                    "Error reading from stdin; terminating task"
                );
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn parses_wire_events() {
        let at = Instant::now();
        let ev = parse_line(r#"{"event":"press","button":"right","x":3,"y":4}"#, at, at).unwrap();
        assert_eq!(ev, RawEvent::press(PointerButton::Right, 3, 4, at));
        let ev = parse_line(r#"{"event":"move","x":-5,"y":9}"#, at, at).unwrap();
        assert_eq!(ev.kind, RawEventKind::Move);
        assert!(parse_line(r#"{"event":"press","x":1,"y":1}"#, at, at).is_err());
        assert!(parse_line(r#"{"event":"scroll","x":1,"y":1}"#, at, at).is_err());
    }

    #[test]
    fn offsets_count_from_the_anchor() {
        let anchor = Instant::now();
        let received = anchor + Duration::from_secs(9);
        let timed = r#"{"event":"press","button":"left","x":1,"y":1,"at_ms":400}"#;
        let ev = parse_line(timed, anchor, received).unwrap();
        assert_eq!(ev.at, anchor + Duration::from_millis(400));

        let untimed = r#"{"event":"press","button":"left","x":1,"y":1}"#;
        assert_eq!(parse_line(untimed, anchor, received).unwrap().at, received);
    }

    #[tokio::test]
    async fn pump_skips_bad_lines_and_stops_at_eof() {
        let input: &[u8] = b"{\"event\":\"move\",\"x\":1,\"y\":2}\n\nnot json\n{\"event\":\"release\",\"button\":\"left\",\"x\":1,\"y\":2}\n";
        let (tx, mut rx) = mpsc::channel(8);
        pump_lines(input, tx, Instant::now()).await;

        let first = rx.recv().await.unwrap();
        assert_eq!((first.kind, first.x, first.y), (RawEventKind::Move, 1, 2));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, RawEventKind::Release(PointerButton::Left));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn supplied_reader_is_consumed_once() {
        let mut hook = StdinHook::from_reader(&b""[..]);
        let (tx, _rx) = mpsc::channel(1);
        hook.attach(tx.clone()).unwrap();
        hook.detach();
        assert!(matches!(hook.attach(tx), Err(Error::InputHook(_))));
    }

    #[test]
    fn test_name_and_new() {
        let h = StdinHook::new();
        assert_eq!(h.name(), "stdin");
    }
}
