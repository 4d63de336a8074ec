//! # Control Surface
//!
//! User actions applied directly to the simulator, outside the tick
//! boundary. Each action validates, mutates, emits its alert and then
//! publishes a fresh snapshot. Actions do not run an extra randomized tick.

use thiserror::Error;
use tracing::{info, warn};

use super::simulator::FridgeSimulator;
use super::timers::{DeferredTask, TimerHandle};
use crate::domain::fridge::ENERGY_SAVER_MAX_SETPOINT_C;
use crate::domain::Severity;

#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    #[error("Invalid setpoint: {0} is not a finite temperature")]
    InvalidSetpoint(f64),
    #[error("Power toggle unavailable while override mode is active")]
    OverrideActive,
}

impl FridgeSimulator {
    /// Sets the target temperature. Only non-finite values are rejected.
    pub fn set_setpoint(&mut self, value: f64) -> Result<(), ControlError> {
        if !value.is_finite() {
            warn!(value, "rejected setpoint");
            return Err(ControlError::InvalidSetpoint(value));
        }

        self.state.setpoint_c = value;
        info!(setpoint_c = value, "setpoint changed");
        self.emit(Severity::Success, format!("Setpoint changed to {value}°C"));
        self.publish_snapshot();
        Ok(())
    }

    /// Switches the compressor on or off. Returns the new compressor state.
    pub fn toggle_power(&mut self) -> Result<bool, ControlError> {
        if self.state.override_mode {
            warn!("power toggle ignored during override");
            return Err(ControlError::OverrideActive);
        }

        if self.state.compressor {
            self.state.compressor = false;
        } else {
            self.state.start_compressor();
        }

        let on = self.state.compressor;
        info!(compressor = on, cycles = self.state.compressor_cycles, "power toggled");
        self.emit(
            Severity::Success,
            if on { "Power turned ON" } else { "Power turned OFF" },
        );
        self.publish_snapshot();
        Ok(on)
    }

    /// Forces the compressor on for the configured override duration.
    ///
    /// Each activation schedules its own expiry; a repeated activation does
    /// not extend an earlier one.
    pub fn activate_override(&mut self) -> TimerHandle {
        self.state.override_mode = true;
        self.state.start_compressor();

        let due = self.clock.now_utc() + self.settings.override_duration;
        let handle = self.schedule(due, DeferredTask::OverrideExpiry);

        info!(%due, cycles = self.state.compressor_cycles, "override mode activated");
        self.emit(Severity::Warning, "Override mode activated");
        self.publish_snapshot();
        handle
    }

    /// Returns whether energy saver is now enabled.
    pub fn toggle_energy_saver(&mut self) -> bool {
        self.state.energy_saver = !self.state.energy_saver;

        if self.state.energy_saver {
            self.state.setpoint_c = (self.state.setpoint_c + 1.0).min(ENERGY_SAVER_MAX_SETPOINT_C);
            info!(setpoint_c = self.state.setpoint_c, "energy saver enabled");
            self.emit(Severity::Success, "Energy saver mode activated");
        } else {
            info!("energy saver disabled");
            self.emit(Severity::Info, "Energy saver mode deactivated");
        }

        self.publish_snapshot();
        self.state.energy_saver
    }

    /// Opens or closes the door. Returns whether the door is now open.
    pub fn toggle_door(&mut self) -> bool {
        self.state.door_open = !self.state.door_open;

        if self.state.door_open {
            info!("door opened");
            self.emit(Severity::Warning, "Door opened");
            let now = self.clock.now_utc();
            self.schedule_door_check(now);
        } else {
            info!("door closed");
            self.emit(Severity::Success, "Door closed");
        }

        self.publish_snapshot();
        self.state.door_open
    }
}
