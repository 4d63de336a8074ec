use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::fridge::PowerSource;

/// Alert severity, mirrors the dashboard's alert colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Human-readable notice emitted by the update engine or a control action.
/// Expiry and display are owned by the consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(message: impl Into<String>, severity: Severity, created_at: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            severity,
            created_at,
        }
    }
}

/// Per-tick telemetry snapshot appended to the data log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub battery_level_percent: f64,
    pub compressor: bool,
    pub power_source: PowerSource,
}
