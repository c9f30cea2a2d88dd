//! The output-sink contract.
//!
//! Every routed event becomes one [`Report`]: a fixed label plus an ordered
//! list of named fields. Formatting and transport are the sink's business.

use std::sync::Mutex;

use bytes::Bytes;

/// Fixed message label attached to every report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportLabel {
    Post,
    Like,
    Repost,
    Follow,
    Block,
    Threadgate,
    Profile,
    FeedGenerator,
    Other,
    HandleUpdate,
    AccountUpdate,
}

impl ReportLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Like => "like",
            Self::Repost => "repost",
            Self::Follow => "follow",
            Self::Block => "block",
            Self::Threadgate => "threadgate",
            Self::Profile => "profile",
            Self::FeedGenerator => "feed_generator",
            Self::Other => "other",
            Self::HandleUpdate => "handle_update",
            Self::AccountUpdate => "account_update",
        }
    }
}

impl std::fmt::Display for ReportLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reported field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Bool(bool),
    /// Structured value passed through unexamined (e.g. a post embed).
    Json(serde_json::Value),
    /// Raw record bytes, unmodified.
    Raw(Bytes),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Json(v) => write!(f, "{v}"),
            Self::Raw(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

/// One reported event.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub label: ReportLabel,
    /// Fields in insertion order.
    pub fields: Vec<(&'static str, FieldValue)>,
}

impl Report {
    pub fn new(label: ReportLabel) -> Self {
        Self {
            label,
            fields: Vec::new(),
        }
    }

    /// Append a field (builder style).
    pub fn with(mut self, name: &'static str, value: impl Into<FieldValue>) -> Self {
        self.fields.push((name, value.into()));
        self
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label.as_str())?;
        for (name, value) in &self.fields {
            write!(f, " {name}={value}")?;
        }
        Ok(())
    }
}

/// Receives every routed event, synchronously, once per event.
pub trait EventSink: Send + Sync {
    fn record(&self, report: Report);
}

/// Sink that keeps every report in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<Report>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far, in arrival order.
    pub fn reports(&self) -> Vec<Report> {
        match self.reports.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.reports().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn record(&self, report: Report) {
        match self.reports.lock() {
            Ok(mut guard) => guard.push(report),
            Err(poisoned) => poisoned.into_inner().push(report),
        }
    }
}
