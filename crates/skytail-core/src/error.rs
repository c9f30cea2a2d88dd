//! Error types for the decode and routing pipeline.

use thiserror::Error;

/// Errors that can occur while decoding a single inbound frame.
///
/// A decode error never tears down the connection: the frame is logged
/// and skipped.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },
}

/// Reasons a recognized collection's record could not be turned into a report.
///
/// The router swallows these; they never reach the output sink.
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    #[error("Commit carries no record")]
    MissingRecord,

    #[error("Record decode failed: {0}")]
    RecordDecode(#[from] serde_json::Error),

    #[error("Record has no subject")]
    MissingSubject,
}
