//! Connector — opens a session to the feed endpoint.
//!
//! The connector makes exactly one attempt per call; retrying is the
//! supervisor's job.

use std::borrow::Cow;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Sink, SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::debug;

use crate::config::StreamConfig;
use crate::error::{ConnectionError, StreamError};
use crate::frame::FrameReader;

/// Send side of an open session, kept by the supervisor for the close handshake.
#[async_trait]
pub trait SessionCloser: Send {
    /// Send a normal-closure control frame.
    async fn send_close(&mut self) -> Result<(), StreamError>;

    /// Close the transport.
    async fn close(&mut self) -> Result<(), StreamError>;
}

/// An open transport session, split into its receive and send halves.
pub struct Session {
    pub reader: FrameReader,
    pub closer: Box<dyn SessionCloser>,
}

impl Session {
    pub fn new(reader: FrameReader, closer: Box<dyn SessionCloser>) -> Self {
        Self { reader, closer }
    }
}

/// Opens sessions to one fixed endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Endpoint this connector dials.
    fn endpoint(&self) -> &str;

    /// Make one connection attempt. Never returns a partial session.
    async fn connect(&self) -> Result<Session, ConnectionError>;
}

/// Handshake deadline when none is configured.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(45);

/// WebSocket connector backed by `tokio-tungstenite`.
///
/// Each attempt is bounded by the handshake timeout: a peer that accepts
/// TCP but never answers the upgrade yields a `TimedOut` connection error.
#[derive(Debug, Clone)]
pub struct WsConnector {
    endpoint: String,
    handshake_timeout: Duration,
}

impl WsConnector {
    /// # Arguments
    /// * `endpoint`: WebSocket URL (`ws://` or `wss://`)
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Connector for `config.endpoint` using `config.connect_timeout()`.
    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.endpoint.clone()).with_handshake_timeout(config.connect_timeout())
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    fn failed(&self, source: WsError) -> ConnectionError {
        ConnectionError {
            url: self.endpoint.clone(),
            source,
        }
    }
}

#[async_trait]
impl Connector for WsConnector {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn connect(&self) -> Result<Session, ConnectionError> {
        let handshake = connect_async(self.endpoint.as_str());
        let (ws_stream, response) = tokio::time::timeout(self.handshake_timeout, handshake)
            .await
            .map_err(|_| {
                self.failed(WsError::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no handshake response within {:?}", self.handshake_timeout),
                )))
            })?
            .map_err(|source| self.failed(source))?;
        debug!(status = %response.status(), "WebSocket handshake complete");

        let (write, read) = ws_stream.split();
        Ok(Session::new(
            FrameReader::new(read),
            Box::new(WsCloser::new(write)),
        ))
    }
}

/// [`SessionCloser`] over any WebSocket message sink.
pub struct WsCloser<S> {
    sink: S,
}

impl<S> WsCloser<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl<S> SessionCloser for WsCloser<S>
where
    S: Sink<Message, Error = WsError> + Unpin + Send,
{
    async fn send_close(&mut self) -> Result<(), StreamError> {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: Cow::Borrowed(""),
        };
        self.sink.send(Message::Close(Some(frame))).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        self.sink.close().await?;
        Ok(())
    }
}
