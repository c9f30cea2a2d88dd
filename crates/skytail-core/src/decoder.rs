//! Envelope decoder — strict structural decode of one frame.

use serde::Deserialize;

use crate::envelope::{AccountPayload, CommitPayload, Envelope, EventKind, IdentityPayload};
use crate::error::DecodeError;

/// Wire shape of the envelope. Everything but `kind` may be absent.
#[derive(Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    did: String,
    #[serde(default)]
    time_us: i64,
    kind: Option<EventKind>,
    #[serde(default)]
    commit: Option<CommitPayload>,
    #[serde(default)]
    identity: Option<IdentityPayload>,
    #[serde(default)]
    account: Option<AccountPayload>,
}

/// Decode one frame's bytes into an [`Envelope`].
///
/// Unknown fields are ignored. Fails on malformed JSON, on a documented
/// field of the wrong type, or when `kind` is absent.
pub fn decode(frame: &[u8]) -> Result<Envelope, DecodeError> {
    let wire: WireEnvelope = serde_json::from_slice(frame)?;
    let kind = wire.kind.ok_or(DecodeError::MissingField { field: "kind" })?;
    Ok(Envelope {
        did: wire.did,
        time_us: wire.time_us,
        kind,
        commit: wire.commit,
        identity: wire.identity,
        account: wire.account,
    })
}
