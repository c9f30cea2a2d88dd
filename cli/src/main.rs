//! Skytail CLI — tail the live event feed and log every event.
//!
//! # Usage
//! ```text
//! skytail                                   # ws://localhost:6008/subscribe
//! skytail --endpoint wss://jetstream2.us-east.bsky.network/subscribe
//! skytail --config skytail.json --json --log-level debug
//! ```
//!
//! Runs until Ctrl-C, then closes the session and exits with status 0.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use skytail_core::Router;
use skytail_observability::{init_tracing, LogConfig, TracingSink};
use skytail_stream::{ShutdownSignal, StreamConfig, Supervisor, WsConnector};
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "skytail",
    about = "Tail a live AT Protocol event feed (Jetstream) to the log",
    version
)]
struct Cli {
    /// Feed endpoint (ws:// or wss://). Overrides the config file.
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Seconds to wait before reconnecting. Overrides the config file.
    #[arg(long)]
    reconnect_secs: Option<u64>,

    /// JSON config file: stream keys at the top level, logging under "log"
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level: trace | debug | info | warn | error. Overrides the config file.
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON log lines instead of text
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Defaults, then the config file, then flags.
    fn stream_config(&self) -> Result<StreamConfig> {
        let mut config = match &self.config {
            Some(path) => StreamConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => StreamConfig::default(),
        };
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if let Some(secs) = self.reconnect_secs {
            config.reconnect_delay_secs = secs;
        }
        config.validate().context("invalid endpoint")?;
        Ok(config)
    }

    fn log_config(&self) -> Result<LogConfig> {
        let mut config = match &self.config {
            Some(path) => LogConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => LogConfig::default(),
        };
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        config.json |= self.json;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.stream_config()?;
    init_tracing(&cli.log_config()?).context("installing tracing subscriber")?;

    info!(endpoint = %config.endpoint, reconnect_secs = config.reconnect_delay_secs, "starting skytail");

    let router = Router::new(Arc::new(TracingSink::new()));
    let connector = WsConnector::from_config(&config);
    let supervisor = Supervisor::new(connector, router, config);

    supervisor.run(ShutdownSignal::ctrl_c()).await;
    Ok(())
}
