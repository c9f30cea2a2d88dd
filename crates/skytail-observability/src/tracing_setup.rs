//! Subscriber installation for the `skytail` binary and embedders.
//!
//! Logging settings live under the `log` key of the same JSON file that
//! carries the stream settings:
//!
//! ```json
//! { "endpoint": "wss://...", "log": { "level": "info", "targets": { "skytail_stream": "debug" }, "json": true } }
//! ```
//!
//! A `RUST_LOG` environment variable, when set, replaces the configured filter.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
pub enum LogSetupError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid log config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("Tracing already initialised: {0}")]
    Init(#[from] TryInitError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    /// Level for every target without its own entry.
    #[serde(default = "default_level")]
    pub level: String,
    /// Per-target levels, keyed by module path (`skytail_stream::supervisor`)
    /// or crate name. Dashes are accepted in crate names.
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            targets: BTreeMap::new(),
            json: false,
        }
    }
}

/// The part of a config file this crate reads.
#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    log: LogConfig,
}

impl LogConfig {
    /// Read the `log` section of a JSON config document. Absent section or
    /// keys take their defaults; other top-level keys are ignored.
    pub fn from_json_str(json: &str) -> Result<Self, LogSetupError> {
        let file: ConfigFile = serde_json::from_str(json)?;
        Ok(file.log)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LogSetupError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LogSetupError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Global level plus one directive per target entry.
    pub fn env_filter(&self) -> Result<EnvFilter, ParseError> {
        let mut filter = EnvFilter::try_new(&self.level)?;
        for (target, level) in &self.targets {
            let directive: Directive = format!("{}={}", target.replace('-', "_"), level).parse()?;
            filter = filter.add_directive(directive);
        }
        Ok(filter)
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<(), LogSetupError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => config.env_filter()?,
    };
    let registry = tracing_subscriber::registry().with(filter);
    let layer = fmt::layer().with_target(true);

    if config.json {
        registry.with(layer.json()).try_init()?;
    } else {
        registry.with(layer).try_init()?;
    }
    Ok(())
}
