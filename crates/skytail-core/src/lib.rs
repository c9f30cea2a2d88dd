//! skytail-core — envelope model, decoder and router for Skytail.
//!
//! # Overview
//!
//! Every inbound frame of the event feed is a JSON document. This crate
//! turns those bytes into typed values and reports them:
//!
//! - [`decode`] — strict structural decode of one frame into an [`Envelope`]
//! - [`Collection`] — the fixed table of known record collections
//! - [`Record`] — lazily decoded inner record for recognized collections
//! - [`Router`] — per-message dispatch on kind and collection
//! - [`EventSink`] — the output contract every report is handed to
//!
//! ```text
//! frame bytes ──decode──▶ Envelope ──Router::route──▶ Report ──▶ EventSink
//! ```

pub mod collection;
pub mod decoder;
pub mod envelope;
pub mod error;
pub mod record;
pub mod router;
pub mod sink;

pub use collection::Collection;
pub use decoder::decode;
pub use envelope::{
    AccountPayload, CommitPayload, Envelope, EventKind, IdentityPayload, Operation, RawRecord,
};
pub use error::{DecodeError, ExtractionFailure};
pub use record::{Record, Subject};
pub use router::Router;
pub use sink::{EventSink, FieldValue, MemorySink, Report, ReportLabel};
