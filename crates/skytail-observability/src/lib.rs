//! # skytail-observability
//!
//! Logging for Skytail.
//!
//! - [`init_tracing`] installs a `tracing-subscriber` pipeline (text or JSON)
//!   with a global level and per-target overrides, read from the `log`
//!   section of the config file.
//! - [`TracingSink`] is the production [`EventSink`](skytail_core::EventSink):
//!   one `info` event per routed feed event, under the `skytail::events` target.

pub mod sink;
pub mod tracing_setup;

pub use sink::{TracingSink, EVENTS_TARGET};
pub use tracing_setup::{init_tracing, LogConfig, LogSetupError};
