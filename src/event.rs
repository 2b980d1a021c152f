//! Detection events as read from the remote document store.
//!
//! Upstream documents are written by the field device and may be partially
//! populated. Parsing never fails: fields with a missing or unexpected shape
//! come back as `None` and the aggregator decides what that means.

use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub type DeviceId = String;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionEvent {
    pub id: String,
    pub label: Option<String>,
    pub confidence: Option<f64>,
    pub timestamp: Option<OffsetDateTime>,
    pub device_id: Option<DeviceId>,
    pub image_url: Option<String>,
}

impl DetectionEvent {
    /// Build an event from a `{detection, confidence, timestamp, pi_id, imageUrl}`
    /// document.
    pub fn from_document(id: impl Into<String>, document: &Value) -> Self {
        Self {
            id: id.into(),
            label: string_field(document, "detection"),
            confidence: document.get("confidence").and_then(Value::as_f64),
            timestamp: document.get("timestamp").and_then(parse_timestamp),
            device_id: string_field(document, "pi_id"),
            image_url: string_field(document, "imageUrl"),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Confidence as a rounded integer percentage, clamped to 0..=100.
    pub fn confidence_percent(&self) -> Option<u8> {
        self.confidence
            .filter(|c| c.is_finite())
            .map(|c| (c * 100.0).round().clamp(0.0, 100.0) as u8)
    }
}

fn string_field(document: &Value, key: &str) -> Option<String> {
    document
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Accepts RFC 3339 strings, Unix seconds and `{seconds, nanoseconds}` objects.
pub fn parse_timestamp(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::String(text) => OffsetDateTime::parse(text, &Rfc3339).ok(),
        Value::Number(number) => {
            let seconds = number.as_i64().or_else(|| number.as_f64().map(|f| f as i64))?;
            OffsetDateTime::from_unix_timestamp(seconds).ok()
        }
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_i64)
                .unwrap_or(0);
            let total = i128::from(seconds) * 1_000_000_000 + i128::from(nanos);
            OffsetDateTime::from_unix_timestamp_nanos(total).ok()
        }
        _ => None,
    }
}
