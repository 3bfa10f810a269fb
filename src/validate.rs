//! Validation of inbound reading payloads.
//!
//! Validation runs in two layers. [`missing_fields`] only checks that every
//! required key is present; [`decode`] then checks types and enumerations and
//! produces a typed [`ReadingInput`]. Both report problems per field so the
//! device gets a machine-readable `errors` map.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::models::{Mode, ReadingInput};
use crate::timestamp;

// ---

/// Field name to human-readable message.
pub type FieldErrors = BTreeMap<String, String>;

pub const REQUIRED_FIELDS: [&str; 6] = [
    "device_id",
    "weight_grams",
    "item_count",
    "is_stable",
    "is_overload",
    "mode",
];

const NOT_AN_INTEGER: &str = "Must be an integer.";
const INTEGER_OUT_OF_RANGE: &str = "Must fit in a signed 64-bit integer.";

/// Report every required field that is not present in the payload.
///
/// Only presence is checked; a `null` value counts as present and is left
/// for [`decode`] to reject.
pub fn missing_fields(payload: &Map<String, Value>) -> FieldErrors {
    // ---
    REQUIRED_FIELDS
        .iter()
        .filter(|field| !payload.contains_key(**field))
        .map(|field| {
            (
                field.to_string(),
                format!("Missing required field: {field}"),
            )
        })
        .collect()
}

/// Decode a payload that passed the presence check into a typed reading.
///
/// All invalid fields are reported together. The optional `timestamp` never
/// causes a rejection; see [`timestamp::normalize_or_absent`].
pub fn decode(payload: &Map<String, Value>) -> Result<ReadingInput, FieldErrors> {
    // ---
    let mut errors = FieldErrors::new();

    let device_id = match payload.get("device_id") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => {
            errors.insert("device_id".into(), "Must be a non-empty string.".into());
            None
        }
    };

    let weight_grams = field_f64(payload, "weight_grams", &mut errors);

    let item_count = match payload
        .get("item_count")
        .map_or(Err(NOT_AN_INTEGER), integer_value)
    {
        Ok(n) if n >= 0 => Some(n),
        Ok(_) => {
            errors.insert("item_count".into(), "Must not be negative.".into());
            None
        }
        Err(message) => {
            errors.insert("item_count".into(), message.into());
            None
        }
    };

    let is_stable = field_bool(payload, "is_stable", &mut errors);
    let is_overload = field_bool(payload, "is_overload", &mut errors);

    let average_item_weight = match payload.get("average_item_weight") {
        None | Some(Value::Null) => None,
        Some(_) => field_f64(payload, "average_item_weight", &mut errors),
    };

    let mode = match payload
        .get("mode")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Mode>().ok())
    {
        Some(mode) => Some(mode),
        None => {
            errors.insert(
                "mode".into(),
                "Must be one of: WEIGHING, COUNTING, ERROR.".into(),
            );
            None
        }
    };

    match (device_id, weight_grams, item_count, is_stable, is_overload, mode) {
        (
            Some(device_id),
            Some(weight_grams),
            Some(item_count),
            Some(is_stable),
            Some(is_overload),
            Some(mode),
        ) if errors.is_empty() => {
            let device_timestamp =
                timestamp::normalize_or_absent(&device_id, payload.get("timestamp"));
            Ok(ReadingInput {
                device_id,
                device_timestamp,
                weight_grams,
                item_count,
                is_stable,
                is_overload,
                average_item_weight,
                mode,
            })
        }
        _ => Err(errors),
    }
}

/// JSON integers, and floats with no fractional part such as `5.0`.
fn integer_value(value: &Value) -> Result<i64, &'static str> {
    // ---
    let Value::Number(n) = value else {
        return Err(NOT_AN_INTEGER);
    };
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    if n.is_u64() {
        return Err(INTEGER_OUT_OF_RANGE);
    }

    // i64::MIN is exactly representable; i64::MAX rounds up to 2^63
    let bound = 2f64.powi(63);
    match n.as_f64() {
        Some(f) if !f.is_finite() || f.fract() != 0.0 => Err(NOT_AN_INTEGER),
        Some(f) if f < -bound || f >= bound => Err(INTEGER_OUT_OF_RANGE),
        Some(f) => Ok(f as i64),
        None => Err(NOT_AN_INTEGER),
    }
}

fn field_f64(payload: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<f64> {
    // ---
    let value = payload.get(field).and_then(Value::as_f64);
    if value.is_none() {
        errors.insert(field.to_string(), "Must be a number.".into());
    }
    value
}

fn field_bool(payload: &Map<String, Value>, field: &str, errors: &mut FieldErrors) -> Option<bool> {
    // ---
    let value = payload.get(field).and_then(Value::as_bool);
    if value.is_none() {
        errors.insert(field.to_string(), "Must be a boolean.".into());
    }
    value
}
