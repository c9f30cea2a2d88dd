//! `Supervisor` — owns the connect / stream / reconnect lifecycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use skytail_core::{decode, DecodeError, Router};
use tokio::sync::{oneshot, watch};
use tokio::time;
use tracing::{debug, error, info};

use crate::config::StreamConfig;
use crate::connector::{Connector, Session, SessionCloser};
use crate::frame::FrameReader;
use crate::shutdown::ShutdownSignal;

/// Lifecycle states, published on [`Supervisor::state`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Disconnected,
    Connecting,
    Streaming,
    Reconnecting,
    ShuttingDown,
    Terminated,
}

/// Metrics snapshot for the supervisor and its consumption tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMetrics {
    pub frames_received: u64,
    pub decode_errors: u64,
    /// Well-formed frames with no `kind`; skipped without an error log.
    pub untyped_frames: u64,
    pub connect_failures: u64,
    pub reconnections: u64,
}

#[derive(Debug, Default)]
struct Counters {
    frames_received: AtomicU64,
    decode_errors: AtomicU64,
    untyped_frames: AtomicU64,
    connect_failures: AtomicU64,
    reconnections: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> StreamMetrics {
        StreamMetrics {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            untyped_frames: self.untyped_frames.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
            reconnections: self.reconnections.load(Ordering::Relaxed),
        }
    }
}

/// Keeps one live session to the feed, forever, until shutdown.
///
/// Every disconnect (failed connect, transport error, clean close) is
/// followed by the same fixed delay and a fresh connect. There is no
/// backoff growth, no retry cap and no resume point: a new session starts
/// at "now".
///
/// # Usage
/// ```no_run
/// # async fn example() {
/// use std::sync::Arc;
/// use skytail_core::{MemorySink, Router};
/// use skytail_stream::{ShutdownSignal, StreamConfig, Supervisor, WsConnector};
///
/// let config = StreamConfig::default();
/// let router = Router::new(Arc::new(MemorySink::new()));
/// let supervisor = Supervisor::new(WsConnector::from_config(&config), router, config);
/// supervisor.run(ShutdownSignal::ctrl_c()).await;
/// # }
/// ```
pub struct Supervisor<C> {
    connector: C,
    router: Router,
    config: StreamConfig,
    counters: Arc<Counters>,
    state: watch::Sender<SupervisorState>,
}

impl<C: Connector> Supervisor<C> {
    pub fn new(connector: C, router: Router, config: StreamConfig) -> Self {
        let (state, _) = watch::channel(SupervisorState::Disconnected);
        Self {
            connector,
            router,
            config,
            counters: Arc::new(Counters::default()),
            state,
        }
    }

    /// Subscribe to lifecycle state changes.
    pub fn state(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Returns a snapshot of current metrics.
    pub fn metrics(&self) -> StreamMetrics {
        self.counters.snapshot()
    }

    /// Run until `shutdown` is raised. Returns the final metrics.
    ///
    /// The reconnect delay is not interrupted by shutdown; the signal is
    /// checked again before every connect attempt.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> StreamMetrics {
        let delay = self.config.reconnect_delay();

        while !shutdown.is_raised() {
            self.transition(SupervisorState::Connecting);
            info!(endpoint = %self.connector.endpoint(), "connecting to feed");

            let Session { reader, closer } = match self.connector.connect().await {
                Ok(session) => session,
                Err(e) => {
                    self.counters.connect_failures.fetch_add(1, Ordering::Relaxed);
                    error!(error = %e, "connection error, retrying in {delay:?}");
                    self.transition(SupervisorState::Reconnecting);
                    time::sleep(delay).await;
                    continue;
                }
            };

            info!("connected");
            self.transition(SupervisorState::Streaming);

            let (done_tx, done_rx) = oneshot::channel();
            // Detached: on shutdown the task is abandoned, not joined.
            tokio::spawn(consume(
                reader,
                self.router.clone(),
                Arc::clone(&self.counters),
                done_tx,
            ));

            let shutting_down = tokio::select! {
                biased;
                () = shutdown.raised() => true,
                _ = done_rx => shutdown.is_raised(),
            };

            if shutting_down {
                self.close_session(closer).await;
                break;
            }

            drop(closer);
            self.counters.reconnections.fetch_add(1, Ordering::Relaxed);
            info!("connection closed, reconnecting in {delay:?}");
            self.transition(SupervisorState::Reconnecting);
            time::sleep(delay).await;
        }

        self.transition(SupervisorState::Terminated);
        let metrics = self.metrics();
        info!(
            frames = metrics.frames_received,
            decode_errors = metrics.decode_errors,
            reconnections = metrics.reconnections,
            "supervisor terminated"
        );
        metrics
    }

    /// Close handshake. Failures are logged, never escalated.
    async fn close_session(&self, mut closer: Box<dyn SessionCloser>) {
        self.transition(SupervisorState::ShuttingDown);
        info!("shutting down");
        if let Err(e) = closer.send_close().await {
            error!(error = %e, "error closing connection");
        }
        if let Err(e) = closer.close().await {
            debug!(error = %e, "transport close after close frame");
        }
    }

    fn transition(&self, next: SupervisorState) {
        let prev = self.state.send_replace(next);
        debug!(from = ?prev, to = ?next, "supervisor state");
    }
}

/// Consumption task: read, decode and route frames strictly in arrival
/// order until the session ends, then signal completion.
async fn consume(
    mut reader: FrameReader,
    router: Router,
    counters: Arc<Counters>,
    done: oneshot::Sender<()>,
) {
    while let Some(frame) = reader.next().await {
        counters.frames_received.fetch_add(1, Ordering::Relaxed);
        match decode(frame.as_bytes()) {
            Ok(envelope) => router.route(&envelope),
            Err(DecodeError::MissingField { field }) => {
                counters.untyped_frames.fetch_add(1, Ordering::Relaxed);
                debug!(field, len = frame.len(), "frame skipped");
            }
            Err(e) => {
                counters.decode_errors.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, len = frame.len(), "parse error");
            }
        }
    }
    let _ = done.send(());
}
