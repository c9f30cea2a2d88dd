//! Stream configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Feed endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:6008/subscribe";

/// Connection settings for the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// WebSocket URL of the subscription endpoint (`ws://` or `wss://`).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Fixed wait between a disconnect and the next connect attempt.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    /// Upper bound on one connect attempt, TCP dial through upgrade response.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_endpoint() -> String { DEFAULT_ENDPOINT.to_string() }
fn default_reconnect_delay_secs() -> u64 { 5 }
fn default_connect_timeout_secs() -> u64 { 45 }

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl StreamConfig {
    /// Config for a single endpoint with the default reconnect delay.
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Parse a JSON config document. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check the endpoint is a well-formed WebSocket URL.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            source,
        })?;
        match url.scheme() {
            "ws" | "wss" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme {
                scheme: other.to_string(),
            }),
        }
    }
}
