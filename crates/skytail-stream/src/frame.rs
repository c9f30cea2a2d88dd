//! Frame reader — turns a WebSocket message stream into raw frames.

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, error, info};

/// One discrete unit of data received from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(Bytes);

impl Frame {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

type MessageStream = Pin<Box<dyn Stream<Item = Result<Message, WsError>> + Send>>;

/// Reads frames from the receive half of a session.
///
/// [`next`](Self::next) returns `None` (end of stream) for a transport
/// error, a close frame and stream exhaustion alike, and keeps returning
/// `None` afterwards.
pub struct FrameReader {
    inner: MessageStream,
    ended: bool,
}

impl FrameReader {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Message, WsError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
            ended: false,
        }
    }

    /// Wait for the next frame.
    pub async fn next(&mut self) -> Option<Frame> {
        if self.ended {
            return None;
        }
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => return Some(Frame::new(text.into_bytes())),
                Some(Ok(Message::Binary(data))) => return Some(Frame::new(data)),
                Some(Ok(Message::Close(frame))) => {
                    info!(?frame, "session closed by peer");
                    break;
                }
                // ping / pong; tungstenite queues pong replies itself
                Some(Ok(other)) => debug!(len = other.len(), "control message skipped"),
                Some(Err(e)) => {
                    error!(error = %e, "read error");
                    break;
                }
                None => {
                    info!("session stream ended");
                    break;
                }
            }
        }
        self.ended = true;
        None
    }
}

impl std::fmt::Debug for FrameReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader").field("ended", &self.ended).finish()
    }
}
