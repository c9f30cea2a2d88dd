//! Collection-specific records, decoded lazily from a commit's raw bytes.

use serde::Deserialize;

use crate::envelope::RawRecord;
use crate::error::ExtractionFailure;

/// Reference to another record (the target of a like, repost, follow or block).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subject {
    pub uri: String,
    #[serde(default)]
    pub cid: String,
}

/// Union of the record fields the router extracts.
///
/// Shape-agnostic: every field is optional and unknown fields are ignored,
/// so one type covers posts and every subject-bearing collection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(rename = "$type")]
    pub record_type: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    /// Opaque embed tree (images, external links, quoted records, ...).
    pub embed: Option<serde_json::Value>,
    #[serde(deserialize_with = "lenient_subject")]
    pub subject: Option<Subject>,
}

/// A subject that is present but not an object with a `uri` is treated as
/// absent, so schema drift surfaces as a missing subject.
fn lenient_subject<'de, D>(deserializer: D) -> Result<Option<Subject>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

impl Record {
    /// Decode a commit's raw record.
    pub fn from_raw(raw: Option<&RawRecord>) -> Result<Self, ExtractionFailure> {
        let raw = raw.ok_or(ExtractionFailure::MissingRecord)?;
        Ok(raw.decode()?)
    }

    /// The record's subject, required by subject-bearing collections.
    pub fn require_subject(&self) -> Result<&Subject, ExtractionFailure> {
        self.subject.as_ref().ok_or(ExtractionFailure::MissingSubject)
    }
}
