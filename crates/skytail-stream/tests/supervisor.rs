//! Lifecycle tests for the supervisor, driven by a scripted connector.
//!
//! All tests run on tokio's paused clock, so reconnect delays are exact.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use skytail_core::{FieldValue, MemorySink, ReportLabel, Router};
use skytail_stream::shutdown::{self, ShutdownTrigger};
use skytail_stream::{
    ConnectionError, Connector, FrameReader, Session, SessionCloser, StreamConfig, StreamError,
    Supervisor, SupervisorState,
};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// What the connector does on one attempt.
enum Step {
    /// Fail to connect.
    Refuse,
    /// Connect, deliver these messages, then end the stream.
    Deliver(Vec<Message>),
}

type Log = Arc<Mutex<Vec<&'static str>>>;

struct RecordingCloser {
    log: Log,
}

#[async_trait]
impl SessionCloser for RecordingCloser {
    async fn send_close(&mut self) -> Result<(), StreamError> {
        self.log.lock().unwrap().push("send_close");
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        self.log.lock().unwrap().push("close");
        Ok(())
    }
}

/// Plays back a script of steps. Once the script runs out it raises
/// shutdown and hands out a session that stays open forever.
struct ScriptedConnector {
    steps: Mutex<VecDeque<Step>>,
    attempts: Arc<Mutex<Vec<Instant>>>,
    closes: Log,
    trigger: ShutdownTrigger,
}

impl ScriptedConnector {
    fn new(steps: Vec<Step>, trigger: ShutdownTrigger) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            attempts: Arc::default(),
            closes: Arc::default(),
            trigger,
        }
    }

    fn session(&self, reader: FrameReader) -> Session {
        Session::new(
            reader,
            Box::new(RecordingCloser {
                log: Arc::clone(&self.closes),
            }),
        )
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    fn endpoint(&self) -> &str {
        "ws://scripted.test/subscribe"
    }

    async fn connect(&self) -> Result<Session, ConnectionError> {
        self.attempts.lock().unwrap().push(Instant::now());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Refuse) => Err(ConnectionError {
                url: self.endpoint().to_string(),
                source: WsError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "refused")),
            }),
            Some(Step::Deliver(messages)) => {
                let items: Vec<Result<Message, WsError>> = messages.into_iter().map(Ok).collect();
                Ok(self.session(FrameReader::new(stream::iter(items))))
            }
            None => {
                self.trigger.raise();
                Ok(self.session(FrameReader::new(stream::pending::<Result<Message, WsError>>())))
            }
        }
    }
}

struct Harness {
    attempts: Arc<Mutex<Vec<Instant>>>,
    closes: Log,
    sink: Arc<MemorySink>,
}

async fn run_script(steps: Vec<Step>) -> (Harness, skytail_stream::StreamMetrics, SupervisorState) {
    let (trigger, signal) = shutdown::channel();
    let connector = ScriptedConnector::new(steps, trigger);
    let harness = Harness {
        attempts: Arc::clone(&connector.attempts),
        closes: Arc::clone(&connector.closes),
        sink: Arc::new(MemorySink::new()),
    };
    let router = Router::new(harness.sink.clone());
    let supervisor = Supervisor::new(connector, router, StreamConfig::default());
    let state = supervisor.state();

    let metrics = supervisor.run(signal).await;
    let final_state = *state.borrow();
    (harness, metrics, final_state)
}

fn gaps(attempts: &[Instant]) -> Vec<Duration> {
    attempts.windows(2).map(|w| w[1] - w[0]).collect()
}

fn text(json: &str) -> Message {
    Message::Text(json.to_string())
}

const POST_HI: &str = r#"{"did":"did:plc:alice","time_us":1,"kind":"commit","commit":{"rev":"r1","operation":"create","collection":"app.bsky.feed.post","rkey":"p1","record":{"$type":"app.bsky.feed.post","text":"hi"},"cid":"c1"}}"#;
const LIKE_X: &str = r#"{"did":"did:plc:alice","time_us":2,"kind":"commit","commit":{"rev":"r2","operation":"create","collection":"app.bsky.feed.like","rkey":"l1","record":{"$type":"app.bsky.feed.like","subject":{"uri":"at://x","cid":"cx"}},"cid":"c2"}}"#;
const HANDLE_ALICE: &str = r#"{"did":"did:plc:alice","time_us":3,"kind":"identity","identity":{"did":"did:plc:alice","handle":"alice","seq":10,"time":"2024-09-09T19:46:02.102Z"}}"#;

#[tokio::test(start_paused = true)]
async fn reconnects_after_fixed_delay_every_time() {
    let (h, metrics, state) = run_script(vec![
        Step::Deliver(vec![]),
        Step::Deliver(vec![]),
        Step::Deliver(vec![]),
        Step::Deliver(vec![]),
    ])
    .await;

    let attempts = h.attempts.lock().unwrap().clone();
    assert_eq!(attempts.len(), 5);
    assert!(gaps(&attempts).iter().all(|d| *d == Duration::from_secs(5)));
    assert_eq!(metrics.reconnections, 4);
    assert_eq!(state, SupervisorState::Terminated);
}

#[tokio::test(start_paused = true)]
async fn connect_failures_retry_after_fixed_delay() {
    let (h, metrics, _) = run_script(vec![Step::Refuse, Step::Refuse, Step::Refuse]).await;

    let attempts = h.attempts.lock().unwrap().clone();
    assert_eq!(attempts.len(), 4);
    assert_eq!(gaps(&attempts), vec![Duration::from_secs(5); 3]);
    assert_eq!(metrics.connect_failures, 3);
    assert_eq!(metrics.reconnections, 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_while_streaming_closes_once_and_stops() {
    let (h, _, state) = run_script(vec![]).await;

    assert_eq!(h.attempts.lock().unwrap().len(), 1);
    assert_eq!(*h.closes.lock().unwrap(), vec!["send_close", "close"]);
    assert_eq!(state, SupervisorState::Terminated);
}

#[tokio::test(start_paused = true)]
async fn shutdown_wins_over_concurrent_stream_end() {
    let (trigger, signal) = shutdown::channel();
    // The stream is already exhausted and shutdown already raised when the
    // supervisor starts waiting; it must close, not reconnect.
    struct EndingConnector {
        trigger: ShutdownTrigger,
        attempts: Arc<Mutex<u32>>,
        closes: Log,
    }

    #[async_trait]
    impl Connector for EndingConnector {
        fn endpoint(&self) -> &str {
            "ws://ending.test"
        }

        async fn connect(&self) -> Result<Session, ConnectionError> {
            *self.attempts.lock().unwrap() += 1;
            self.trigger.raise();
            Ok(Session::new(
                FrameReader::new(stream::empty::<Result<Message, WsError>>()),
                Box::new(RecordingCloser {
                    log: Arc::clone(&self.closes),
                }),
            ))
        }
    }

    let attempts = Arc::new(Mutex::new(0));
    let closes: Log = Arc::default();
    let connector = EndingConnector {
        trigger,
        attempts: Arc::clone(&attempts),
        closes: Arc::clone(&closes),
    };
    let sink = Arc::new(MemorySink::new());
    let supervisor = Supervisor::new(connector, Router::new(sink), StreamConfig::default());

    let started = Instant::now();
    let metrics = supervisor.run(signal).await;

    assert_eq!(*attempts.lock().unwrap(), 1);
    assert_eq!(*closes.lock().unwrap(), vec!["send_close", "close"]);
    assert_eq!(metrics.reconnections, 0);
    assert_eq!(Instant::now(), started, "no reconnect delay was taken");
}

#[tokio::test(start_paused = true)]
async fn shutdown_before_start_never_connects() {
    let (trigger, signal) = shutdown::channel();
    trigger.raise();
    let connector = ScriptedConnector::new(vec![], trigger.clone());
    let attempts = Arc::clone(&connector.attempts);
    let supervisor = Supervisor::new(
        connector,
        Router::new(Arc::new(MemorySink::new())),
        StreamConfig::default(),
    );
    let state = supervisor.state();

    supervisor.run(signal).await;

    assert!(attempts.lock().unwrap().is_empty());
    assert_eq!(*state.borrow(), SupervisorState::Terminated);
}

#[tokio::test(start_paused = true)]
async fn end_to_end_three_frames_in_order() {
    let (h, metrics, _) = run_script(vec![Step::Deliver(vec![
        text(POST_HI),
        text(LIKE_X),
        text(HANDLE_ALICE),
    ])])
    .await;

    let reports = h.sink.reports();
    let labels: Vec<_> = reports.iter().map(|r| r.label).collect();
    assert_eq!(
        labels,
        vec![ReportLabel::Post, ReportLabel::Like, ReportLabel::HandleUpdate]
    );
    assert_eq!(reports[0].field("text").and_then(FieldValue::as_str), Some("hi"));
    assert_eq!(reports[1].field("post_uri").and_then(FieldValue::as_str), Some("at://x"));
    assert_eq!(reports[2].field("handle").and_then(FieldValue::as_str), Some("alice"));
    assert_eq!(metrics.frames_received, 3);
}

#[tokio::test(start_paused = true)]
async fn malformed_frame_does_not_stop_the_stream() {
    let (h, metrics, _) = run_script(vec![Step::Deliver(vec![
        text("{not json"),
        text(r#"{"did":"did:plc:a","time_us":1}"#),
        Message::Ping(vec![]),
        text(POST_HI),
    ])])
    .await;

    let reports = h.sink.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].label, ReportLabel::Post);
    assert_eq!(metrics.decode_errors, 1);
    assert_eq!(metrics.untyped_frames, 1);
    assert_eq!(metrics.frames_received, 3);
    // only one stream end: the session survived both bad frames
    assert_eq!(metrics.reconnections, 1);
}

#[tokio::test(start_paused = true)]
async fn state_watch_reports_progress() {
    let (trigger, signal) = shutdown::channel();
    let connector = ScriptedConnector::new(vec![Step::Refuse], trigger);
    let supervisor = Supervisor::new(
        connector,
        Router::new(Arc::new(MemorySink::new())),
        StreamConfig::default(),
    );
    let mut state = supervisor.state();
    assert_eq!(*state.borrow(), SupervisorState::Disconnected);

    // The watch channel coalesces; only states held across a suspension
    // point (the reconnect delay) are guaranteed to be observed.
    let watcher = tokio::spawn(async move {
        let mut seen = vec![*state.borrow_and_update()];
        while state.changed().await.is_ok() {
            let s = *state.borrow_and_update();
            seen.push(s);
            if s == SupervisorState::Terminated {
                break;
            }
        }
        seen
    });
    tokio::task::yield_now().await;

    supervisor.run(signal).await;
    let seen = watcher.await.unwrap();

    assert_eq!(seen.first(), Some(&SupervisorState::Disconnected));
    assert!(seen.contains(&SupervisorState::Reconnecting), "{seen:?}");
    assert_eq!(seen.last(), Some(&SupervisorState::Terminated));
}

#[tokio::test]
async fn frame_reader_over_stream_combinators() {
    // A reader built from a combinator chain behaves like a live socket.
    let messages = stream::iter(vec![text(POST_HI), text(LIKE_X)]).map(Ok::<_, WsError>);
    let mut reader = FrameReader::new(messages);
    assert!(reader.next().await.is_some());
    assert!(reader.next().await.is_some());
    assert!(reader.next().await.is_none());
}
