//! Data models for scale telemetry readings.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---

/// Operational state of the scale when the reading was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    // ---
    Weighing,
    Counting,
    Error,
}

impl Mode {
    // ---
    pub const ALL: [Mode; 3] = [Mode::Weighing, Mode::Counting, Mode::Error];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Weighing => "WEIGHING",
            Mode::Counting => "COUNTING",
            Mode::Error => "ERROR",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown mode '{s}'"))
    }
}

/// A decoded and validated reading, as submitted by a device.
///
/// Carries everything except the fields the server assigns on storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingInput {
    // ---
    pub device_id: String,
    pub device_timestamp: Option<DateTime<Utc>>,
    pub weight_grams: f64,
    pub item_count: i64,
    pub is_stable: bool,
    pub is_overload: bool,
    pub average_item_weight: Option<f64>,
    pub mode: Mode,
}

/// A stored reading, as returned by `GET /api/v1/readings/{device_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    // ---
    pub id: Uuid,
    pub device_id: String,
    pub device_timestamp: Option<DateTime<Utc>>,
    pub server_timestamp: DateTime<Utc>,
    pub weight_grams: f64,
    pub item_count: i64,
    pub is_stable: bool,
    pub is_overload: bool,
    pub average_item_weight: Option<f64>,
    pub mode: Mode,
}

impl ReadingInput {
    // ---
    /// Turn the input into a stored record with server-assigned fields.
    pub fn into_reading(self, server_timestamp: DateTime<Utc>) -> Reading {
        // ---
        Reading {
            id: Uuid::new_v4(),
            device_id: self.device_id,
            device_timestamp: self.device_timestamp,
            server_timestamp,
            weight_grams: self.weight_grams,
            item_count: self.item_count,
            is_stable: self.is_stable,
            is_overload: self.is_overload,
            average_item_weight: self.average_item_weight,
            mode: self.mode,
        }
    }
}
