//! # Dashboard Status
//!
//! Read-only projections computed from a [`FridgeState`] snapshot for the
//! UI and export consumers. Nothing here mutates state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::fridge::{FridgeState, PowerSource};

/// Assumed usable battery capacity (Wh)
pub const BATTERY_CAPACITY_WH: f64 = 100.0;
/// Assumed compressor draw while running (W)
pub const COMPRESSOR_DRAW_W: f64 = 5.0;
/// Deviation from setpoint that flags the temperature display (°C)
pub const TEMPERATURE_ALARM_BAND_C: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionStatus {
    Online,
    Offline,
    Error,
}

/// What the power button shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PowerMode {
    Override,
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryRuntime {
    pub hours: u32,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub connection: ConnectionStatus,
    pub power_mode: PowerMode,
    /// Remaining runtime; `None` while the compressor is idle (more than 24h)
    pub battery_runtime: Option<BatteryRuntime>,
    pub temperature_out_of_range: bool,
}

impl StatusReport {
    pub fn from_state(state: &FridgeState) -> Self {
        let connection = if state.error.is_some() {
            ConnectionStatus::Error
        } else if state.online {
            ConnectionStatus::Online
        } else {
            ConnectionStatus::Offline
        };

        let power_mode = if state.override_mode {
            PowerMode::Override
        } else if state.compressor {
            PowerMode::On
        } else {
            PowerMode::Off
        };

        Self {
            connection,
            power_mode,
            battery_runtime: battery_runtime(state),
            temperature_out_of_range: (state.temperature_c - state.setpoint_c).abs()
                > TEMPERATURE_ALARM_BAND_C,
        }
    }
}

fn battery_runtime(state: &FridgeState) -> Option<BatteryRuntime> {
    if !state.compressor {
        return None;
    }
    let remaining_wh = state.battery_level_percent / 100.0 * BATTERY_CAPACITY_WH;
    let hours_left = remaining_wh / COMPRESSOR_DRAW_W;
    Some(BatteryRuntime {
        hours: hours_left.floor() as u32,
        minutes: (hours_left.fract() * 60.0).floor() as u32,
    })
}

/// Control flags and readings included in an export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatusBlock {
    pub temperature_c: f64,
    pub setpoint_c: f64,
    pub battery_level_percent: f64,
    pub power_source: PowerSource,
    pub compressor: bool,
    pub energy_saver: bool,
    pub override_mode: bool,
    pub door_open: bool,
}

/// Aggregates consumed by the export collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub system_status: SystemStatusBlock,
    pub avg_temperature_c: f64,
    pub total_solar_input_wh: f64,
    pub total_battery_usage_wh: f64,
    pub compressor_cycles: u64,
    pub generated_at: DateTime<Utc>,
}

impl ExportSummary {
    pub fn from_state(state: &FridgeState, generated_at: DateTime<Utc>) -> Self {
        Self {
            system_status: SystemStatusBlock {
                temperature_c: state.temperature_c,
                setpoint_c: state.setpoint_c,
                battery_level_percent: state.battery_level_percent,
                power_source: state.power_source,
                compressor: state.compressor,
                energy_saver: state.energy_saver,
                override_mode: state.override_mode,
                door_open: state.door_open,
            },
            avg_temperature_c: state.history.average_temperature(),
            total_solar_input_wh: state.history.total_solar_input(),
            total_battery_usage_wh: state.history.total_battery_usage(),
            compressor_cycles: state.compressor_cycles,
            generated_at,
        }
    }
}
