//! Envelope types — the outer unit of every inbound frame.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;

/// Discriminates which optional payload of an [`Envelope`] is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Commit,
    Identity,
    Account,
    /// A kind this build does not know about. Decodes fine, routes nowhere.
    #[serde(other)]
    Unknown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Identity => "identity",
            Self::Account => "account",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded frame of the event feed.
///
/// Transient: built per frame, routed, then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Repository / actor the event originates from.
    pub did: String,
    /// Microseconds since the Unix epoch. Monotonic per `did` only.
    pub time_us: i64,
    pub kind: EventKind,
    pub commit: Option<CommitPayload>,
    pub identity: Option<IdentityPayload>,
    pub account: Option<AccountPayload>,
}

/// Commit operation name (`create`, `update`, `delete`, ...).
///
/// Kept as the upstream string; only equality matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Operation(pub String);

impl Operation {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_create(&self) -> bool {
        self.0 == "create"
    }

    pub fn is_delete(&self) -> bool {
        self.0 == "delete"
    }
}

impl From<&str> for Operation {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Undecoded inner record, exactly as it appeared in the frame.
///
/// Only the handler for a recognized collection decodes it; everything
/// else passes the bytes through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord(pub Bytes);

impl RawRecord {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decode the record into a concrete shape.
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.0)
    }
}

impl<'de> Deserialize<'de> for RawRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Box::<RawValue>::deserialize(deserializer)?;
        Ok(Self(Bytes::copy_from_slice(raw.get().as_bytes())))
    }
}

/// Create / update / delete of one record in a remote repository.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommitPayload {
    /// Repository revision token.
    pub rev: String,
    pub operation: Operation,
    /// Dot-segmented schema name, e.g. `app.bsky.feed.post`.
    pub collection: String,
    /// Record key within the collection.
    pub rkey: String,
    pub record: Option<RawRecord>,
    /// Content hash of the record, absent on deletes.
    pub cid: Option<String>,
}

/// Handle change for an actor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdentityPayload {
    pub did: String,
    pub handle: String,
    pub seq: i64,
    pub time: String,
}

/// Account status change (activation / deactivation).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccountPayload {
    pub active: bool,
    pub did: String,
    pub seq: i64,
    pub time: String,
}
