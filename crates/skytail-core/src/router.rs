//! Per-message dispatch on event kind and commit collection.
//!
//! The router holds no state between calls. Every envelope produces either
//! exactly one [`Report`] or nothing at all.

use std::sync::Arc;

use tracing::trace;

use crate::collection::Collection;
use crate::envelope::{CommitPayload, Envelope, EventKind};
use crate::error::ExtractionFailure;
use crate::record::Record;
use crate::sink::{EventSink, FieldValue, Report, ReportLabel};

/// Routes decoded envelopes to the output sink.
#[derive(Clone)]
pub struct Router {
    sink: Arc<dyn EventSink>,
}

impl Router {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Classify one envelope and report it, or drop it silently.
    pub fn route(&self, envelope: &Envelope) {
        let report = match envelope.kind {
            EventKind::Commit => match &envelope.commit {
                Some(commit) => match commit_report(envelope, commit) {
                    Ok(report) => report,
                    Err(e) => {
                        trace!(
                            did = %envelope.did,
                            collection = %commit.collection,
                            rkey = %commit.rkey,
                            reason = %e,
                            "commit dropped"
                        );
                        return;
                    }
                },
                None => return,
            },
            EventKind::Identity => match &envelope.identity {
                Some(identity) => Report::new(ReportLabel::HandleUpdate)
                    .with("did", envelope.did.as_str())
                    .with("handle", identity.handle.as_str())
                    .with("seq", identity.seq),
                None => return,
            },
            EventKind::Account => match &envelope.account {
                Some(account) => Report::new(ReportLabel::AccountUpdate)
                    .with("did", envelope.did.as_str())
                    .with("active", account.active)
                    .with("seq", account.seq),
                None => return,
            },
            EventKind::Unknown => return,
        };

        self.sink.record(report);
    }
}

/// Build the report for one commit, or fail for a record that does not
/// have the shape its collection needs.
fn commit_report(envelope: &Envelope, commit: &CommitPayload) -> Result<Report, ExtractionFailure> {
    let collection = Collection::from_nsid(&commit.collection);
    let base = Report::new(collection.label())
        .with("did", envelope.did.as_str())
        .with("op", commit.operation.as_str());

    let report = match &collection {
        Collection::Post => {
            let record = Record::from_raw(commit.record.as_ref())?;
            base.with("text", record.text.unwrap_or_default())
                .with("rkey", commit.rkey.as_str())
                .with(
                    "embed",
                    FieldValue::Json(record.embed.unwrap_or(serde_json::Value::Null)),
                )
        }
        Collection::Like | Collection::Repost => {
            let record = Record::from_raw(commit.record.as_ref())?;
            let subject = record.require_subject()?;
            base.with("post_uri", subject.uri.as_str())
                .with("post_cid", subject.cid.as_str())
                .with("rkey", commit.rkey.as_str())
        }
        Collection::Follow | Collection::Block => {
            let record = Record::from_raw(commit.record.as_ref())?;
            let subject = record.require_subject()?;
            base.with("subject", subject.uri.as_str())
                .with("rkey", commit.rkey.as_str())
        }
        Collection::Threadgate => base.with("rkey", commit.rkey.as_str()),
        Collection::Profile => base
            .with("rkey", commit.rkey.as_str())
            .with("data", raw_bytes(commit)),
        Collection::FeedGenerator => base
            .with("rkey", commit.rkey.as_str())
            .with("data", raw_bytes(commit)),
        Collection::Other(nsid) => base
            .with("collection", nsid.as_str())
            .with("rkey", commit.rkey.as_str())
            .with("data", raw_bytes(commit)),
    };
    Ok(report)
}

fn raw_bytes(commit: &CommitPayload) -> FieldValue {
    FieldValue::Raw(
        commit
            .record
            .as_ref()
            .map(|r| r.0.clone())
            .unwrap_or_default(),
    )
}
