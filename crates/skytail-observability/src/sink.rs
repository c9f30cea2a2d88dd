//! Log-backed event sink.

use serde_json::{Map, Value};
use skytail_core::{EventSink, FieldValue, Report};
use tracing::info;

/// Tracing target every feed event is emitted under.
pub const EVENTS_TARGET: &str = "skytail::events";

/// [`EventSink`] that writes each report as one `info` event.
///
/// The report label is the message; the fields travel as one JSON object
/// so they stay structured in both text and JSON output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for TracingSink {
    fn record(&self, report: Report) {
        let fields = fields_json(&report);
        info!(target: EVENTS_TARGET, fields = %fields, "{}", report.label);
    }
}

/// Render report fields as a JSON object.
///
/// Raw record bytes are embedded as JSON when they parse, and as a string
/// otherwise.
pub fn fields_json(report: &Report) -> Value {
    let mut map = Map::with_capacity(report.fields.len());
    for (name, value) in &report.fields {
        let v = match value {
            FieldValue::Str(s) => Value::String(s.clone()),
            FieldValue::Int(n) => Value::from(*n),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Json(v) => v.clone(),
            FieldValue::Raw(bytes) if bytes.is_empty() => Value::Null,
            FieldValue::Raw(bytes) => serde_json::from_slice(bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
        };
        map.insert((*name).to_string(), v);
    }
    Value::Object(map)
}
