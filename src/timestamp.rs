//! Normalization of device-supplied timestamps.
//!
//! Devices report `timestamp` either as epoch milliseconds (integer or float)
//! or as an ISO-8601 string. Both forms are normalized to a UTC instant. A
//! timestamp that cannot be understood never rejects the reading: callers go
//! through [`normalize_or_absent`], which logs the failure and drops the field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

// ---

/// Offset-carrying forms not covered by RFC 3339: minute precision, a
/// space separator, and offsets written without a colon.
const OFFSET_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M%z",
];

/// Formats tried, in order, for strings that carry no UTC offset.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only strings mean midnight UTC.
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq)]
pub enum TimestampParseError {
    // ---
    #[error("epoch milliseconds {0} out of range")]
    OutOfRange(String),

    #[error("invalid ISO-8601 timestamp '{0}'")]
    Invalid(String),

    #[error("unsupported timestamp type: {0}")]
    UnsupportedType(&'static str),
}

/// Normalize a raw `timestamp` value to a UTC instant.
///
/// Returns `Ok(None)` when the value is absent or `null`.
pub fn normalize(raw: Option<&Value>) -> Result<Option<DateTime<Utc>>, TimestampParseError> {
    // ---
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => from_epoch_millis(n).map(Some),
        Some(Value::String(s)) => parse_iso8601(s).map(Some),
        Some(Value::Bool(_)) => Err(TimestampParseError::UnsupportedType("boolean")),
        Some(Value::Array(_)) => Err(TimestampParseError::UnsupportedType("array")),
        Some(Value::Object(_)) => Err(TimestampParseError::UnsupportedType("object")),
    }
}

/// Soft-failing variant of [`normalize`]: parse errors degrade to `None`.
pub fn normalize_or_absent(device_id: &str, raw: Option<&Value>) -> Option<DateTime<Utc>> {
    // ---
    match normalize(raw) {
        Ok(ts) => ts,
        Err(e) => {
            warn!(%device_id, "Ignoring device timestamp: {}", e);
            None
        }
    }
}

fn from_epoch_millis(n: &serde_json::Number) -> Result<DateTime<Utc>, TimestampParseError> {
    // ---
    let out_of_range = || TimestampParseError::OutOfRange(n.to_string());

    if let Some(ms) = n.as_i64() {
        return DateTime::from_timestamp_millis(ms).ok_or_else(out_of_range);
    }

    // Floats (and u64 beyond i64) keep microsecond precision
    let ms = n.as_f64().ok_or_else(out_of_range)?;
    let micros = ms * 1000.0;
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return Err(out_of_range());
    }
    DateTime::from_timestamp_micros(micros.trunc() as i64).ok_or_else(out_of_range)
}

fn parse_iso8601(raw: &str) -> Result<DateTime<Utc>, TimestampParseError> {
    // ---
    let s = raw.trim();
    let normalized = match s.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => s.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&normalized, fmt).ok())
    {
        return Ok(dt.with_timezone(&Utc));
    }

    // No offset at all: the value is taken to be UTC already
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
    {
        return Ok(naive.and_utc());
    }

    NaiveDate::parse_from_str(&normalized, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimestampParseError::Invalid(raw.to_string()))
}
