//! # skytail-stream
//!
//! Connection lifecycle for the Skytail event feed.
//!
//! Opens a WebSocket session to the feed endpoint, reads frames in arrival
//! order, decodes and routes each one, and reconnects after a fixed delay
//! whenever the session ends, until shutdown is requested.
//!
//! ## Architecture
//! ```text
//! Supervisor (loop)
//!     │ connect
//!     ▼
//! Connector ──▶ Session { FrameReader, SessionCloser }
//!                   │
//!                   ▼  spawned consumption task
//!             decode ──▶ Router ──▶ EventSink
//!                   │
//!                   ▼  oneshot "stream ended"
//! Supervisor select { stream ended | shutdown } ──▶ reconnect | close handshake
//! ```

pub mod config;
pub mod connector;
pub mod error;
pub mod frame;
pub mod shutdown;
pub mod supervisor;

pub use config::{StreamConfig, DEFAULT_ENDPOINT};
pub use connector::{
    Connector, Session, SessionCloser, WsCloser, WsConnector, DEFAULT_HANDSHAKE_TIMEOUT,
};
pub use error::{ConfigError, ConnectionError, StreamError};
pub use frame::{Frame, FrameReader};
pub use shutdown::{ShutdownSignal, ShutdownTrigger};
pub use supervisor::{StreamMetrics, Supervisor, SupervisorState};
