//! Error types for the connection lifecycle.

use std::path::PathBuf;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

/// Failure to establish a session. Never fatal: the supervisor retries.
#[derive(Debug, Error)]
#[error("Connection to {url} failed: {source}")]
pub struct ConnectionError {
    pub url: String,
    #[source]
    pub source: WsError,
}

/// Errors raised by an open session.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

/// Errors loading or validating a [`StreamConfig`](crate::StreamConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported endpoint scheme '{scheme}' (expected ws or wss)")]
    UnsupportedScheme { scheme: String },
}
