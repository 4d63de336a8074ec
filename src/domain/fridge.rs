//! # Fridge State
//!
//! The single mutable record describing the simulated refrigeration unit,
//! together with the threshold functions used to derive its status fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

/// Length of every history window (one slot per day).
pub const HISTORY_DAYS: usize = 7;

pub const TEMPERATURE_MIN_C: f64 = -20.0;
pub const TEMPERATURE_MAX_C: f64 = 20.0;

pub const BATTERY_MIN_PERCENT: f64 = 0.0;
pub const BATTERY_MAX_PERCENT: f64 = 100.0;

/// Solar intensity above which the fridge runs from solar power.
pub const SOLAR_POWER_THRESHOLD: f64 = 0.3;

/// Highest setpoint the energy saver will raise to.
pub const ENERGY_SAVER_MAX_SETPOINT_C: f64 = 8.0;

/// Where the unit currently draws its power from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PowerSource {
    Solar,
    Battery,
}

impl PowerSource {
    pub fn from_intensity(solar_intensity: f64) -> Self {
        if solar_intensity > SOLAR_POWER_THRESHOLD {
            PowerSource::Solar
        } else {
            PowerSource::Battery
        }
    }
}

/// Battery health, derived from the charge level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum BatteryHealth {
    Critical,
    Low,
    Good,
    Full,
}

impl BatteryHealth {
    pub fn from_level(level_percent: f64) -> Self {
        if level_percent < 10.0 {
            BatteryHealth::Critical
        } else if level_percent < 30.0 {
            BatteryHealth::Low
        } else if level_percent > 90.0 {
            BatteryHealth::Full
        } else {
            BatteryHealth::Good
        }
    }
}

/// Direction of the last temperature change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TempTrend {
    Rising,
    Falling,
    Steady,
}

impl TempTrend {
    pub fn from_change(change_c: f64) -> Self {
        if change_c > 0.1 {
            TempTrend::Rising
        } else if change_c < -0.1 {
            TempTrend::Falling
        } else {
            TempTrend::Steady
        }
    }
}

/// Simulated hardware fault. These are status data, never program errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    #[strum(to_string = "Temperature sensor fault")]
    SensorFault,
    #[strum(to_string = "Compressor overload")]
    CompressorOverload,
    #[strum(to_string = "Battery communication error")]
    BatteryCommError,
    #[strum(to_string = "Solar regulator offline")]
    SolarRegulatorOffline,
}

impl FaultKind {
    pub const ALL: [FaultKind; 4] = [
        FaultKind::SensorFault,
        FaultKind::CompressorOverload,
        FaultKind::BatteryCommError,
        FaultKind::SolarRegulatorOffline,
    ];
}

/// Seven-day sliding windows, oldest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Temperature readings (°C)
    pub temperature: [f64; HISTORY_DAYS],
    /// Daily solar input (Wh)
    pub solar_input: [f64; HISTORY_DAYS],
    /// Daily battery usage (Wh)
    pub battery_usage: [f64; HISTORY_DAYS],
}

impl History {
    /// Drop the oldest slot of `window` and append `value`.
    pub fn shift_push(window: &mut [f64; HISTORY_DAYS], value: f64) {
        window.rotate_left(1);
        window[HISTORY_DAYS - 1] = value;
    }

    pub fn average_temperature(&self) -> f64 {
        self.temperature.iter().sum::<f64>() / HISTORY_DAYS as f64
    }

    pub fn total_solar_input(&self) -> f64 {
        self.solar_input.iter().sum()
    }

    pub fn total_battery_usage(&self) -> f64 {
        self.battery_usage.iter().sum()
    }
}

/// Violated state invariant
#[derive(Debug, Error, PartialEq)]
pub enum InvariantError {
    #[error("temperature {0}°C outside [-20, 20]")]
    TemperatureOutOfRange(f64),
    #[error("battery level {0}% outside [0, 100]")]
    BatteryOutOfRange(f64),
    #[error("solar intensity {0} outside [0, 1]")]
    SolarIntensityOutOfRange(f64),
    #[error("battery health {actual} does not match level {level}% (expected {expected})")]
    HealthMismatch {
        level: f64,
        actual: BatteryHealth,
        expected: BatteryHealth,
    },
    #[error("power source {actual} does not match solar intensity {intensity}")]
    PowerSourceMismatch { intensity: f64, actual: PowerSource },
}

/// Complete state of the simulated fridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FridgeState {
    /// Cabinet temperature (°C)
    pub temperature_c: f64,
    /// User target temperature (°C)
    pub setpoint_c: f64,
    /// Battery charge (%)
    pub battery_level_percent: f64,
    pub battery_health: BatteryHealth,
    /// Solar charge rate of the last tick (W)
    pub charge_rate_w: f64,
    pub power_source: PowerSource,
    pub compressor: bool,
    pub override_mode: bool,
    pub energy_saver: bool,
    pub door_open: bool,
    pub online: bool,
    /// Active simulated fault, if any
    pub error: Option<FaultKind>,
    pub temp_trend: TempTrend,
    /// Unitless solar availability (0.0-1.0)
    pub solar_intensity: f64,
    /// Number of compressor start-ups
    pub compressor_cycles: u64,
    pub history: History,
    pub last_update: DateTime<Utc>,
}

impl FridgeState {
    /// Starts the compressor and counts the cycle.
    pub(crate) fn start_compressor(&mut self) {
        self.compressor = true;
        self.compressor_cycles += 1;
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if !(TEMPERATURE_MIN_C..=TEMPERATURE_MAX_C).contains(&self.temperature_c) {
            return Err(InvariantError::TemperatureOutOfRange(self.temperature_c));
        }
        if !(BATTERY_MIN_PERCENT..=BATTERY_MAX_PERCENT).contains(&self.battery_level_percent) {
            return Err(InvariantError::BatteryOutOfRange(self.battery_level_percent));
        }
        if !(0.0..=1.0).contains(&self.solar_intensity) {
            return Err(InvariantError::SolarIntensityOutOfRange(self.solar_intensity));
        }
        let expected = BatteryHealth::from_level(self.battery_level_percent);
        if self.battery_health != expected {
            return Err(InvariantError::HealthMismatch {
                level: self.battery_level_percent,
                actual: self.battery_health,
                expected,
            });
        }
        if self.power_source != PowerSource::from_intensity(self.solar_intensity) {
            return Err(InvariantError::PowerSourceMismatch {
                intensity: self.solar_intensity,
                actual: self.power_source,
            });
        }
        Ok(())
    }
}
