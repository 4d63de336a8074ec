//! # Fridge Simulator
//!
//! Single owner of the simulation: the [`FridgeState`] record, the data log,
//! pending deferred timers, the random source and the clock. Every mutation
//! (tick, control action, fired timer) goes through `&mut self`, so callers
//! that share a simulator must serialize access (see `controller`).
//!
//! Consumers observe the simulator through:
//! - [`FridgeSimulator::snapshot`] / [`FridgeSimulator::log`] (pull)
//! - [`FridgeSimulator::subscribe_alerts`] (push, emission order)
//! - [`FridgeSimulator::watch_snapshots`] (notified after each tick/action)

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use super::engine::{self, RandomEvent};
use super::environment::{solar_intensity, Clock};
use super::random::RandomSource;
use super::timers::{DeferredTask, TimerHandle, TimerQueue};
use crate::config::{FridgeConfig, SimulationConfig, MAX_TIMER_DELAY_SECS};
use crate::domain::{
    AlertEvent, BatteryHealth, DataLog, ExportSummary, FridgeState, LogEntry, PowerSource,
    Severity, StatusReport, TempTrend,
};

/// Runtime knobs of a simulator instance
#[derive(Debug, Clone)]
pub struct SimulatorSettings {
    pub override_duration: Duration,
    pub door_alarm_delay: Duration,
    pub log_capacity: usize,
    pub alert_channel_capacity: usize,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

impl From<&SimulationConfig> for SimulatorSettings {
    fn from(cfg: &SimulationConfig) -> Self {
        Self {
            override_duration: timer_delay(cfg.override_duration_secs),
            door_alarm_delay: timer_delay(cfg.door_alarm_secs),
            log_capacity: cfg.log_capacity,
            alert_channel_capacity: cfg.alert_channel_capacity.max(1),
        }
    }
}

/// Delays past one day are capped so deadline arithmetic cannot overflow.
fn timer_delay(secs: u64) -> Duration {
    Duration::seconds(i64::try_from(secs.min(MAX_TIMER_DELAY_SECS)).unwrap_or_default())
}

pub struct FridgeSimulator {
    pub(super) state: FridgeState,
    pub(super) settings: SimulatorSettings,
    pub(super) clock: Arc<dyn Clock>,
    log: DataLog,
    timers: TimerQueue,
    rng: Box<dyn RandomSource>,
    alerts: broadcast::Sender<AlertEvent>,
    snapshots: watch::Sender<FridgeState>,
    ticks: u64,
}

impl FridgeSimulator {
    /// Creates a simulator with seeded readings and a synthesized history.
    pub fn new(
        initial: &FridgeConfig,
        settings: SimulatorSettings,
        clock: Arc<dyn Clock>,
        mut rng: Box<dyn RandomSource>,
    ) -> Self {
        let now = clock.now();
        let intensity = solar_intensity(&now);
        let history = engine::initial_history(rng.as_mut());

        let state = FridgeState {
            temperature_c: initial.temperature_c,
            setpoint_c: initial.setpoint_c,
            battery_level_percent: initial.battery_level_percent,
            battery_health: BatteryHealth::from_level(initial.battery_level_percent),
            charge_rate_w: 0.0,
            power_source: PowerSource::from_intensity(intensity),
            compressor: false,
            override_mode: false,
            energy_saver: false,
            door_open: false,
            online: true,
            error: None,
            temp_trend: TempTrend::Steady,
            solar_intensity: intensity,
            compressor_cycles: initial.compressor_cycles,
            history,
            last_update: now.with_timezone(&Utc),
        };

        let (alerts, _) = broadcast::channel(settings.alert_channel_capacity);
        let (snapshots, _) = watch::channel(state.clone());

        Self {
            state,
            log: DataLog::new(settings.log_capacity),
            settings,
            clock,
            timers: TimerQueue::new(),
            rng,
            alerts,
            snapshots,
            ticks: 0,
        }
    }

    /// Runs one update cycle: environment, temperature, battery, random
    /// events, history, log entry, snapshot notification.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        let now_utc = now.with_timezone(&Utc);
        self.state.last_update = now_utc;

        engine::update_environment(&mut self.state, &now);
        let change = engine::update_temperature(&mut self.state);

        let health = engine::update_battery(&mut self.state, self.rng.as_mut());
        if health == BatteryHealth::Critical {
            self.emit(Severity::Error, "Battery critically low");
        }

        for event in engine::inject_random_events(&mut self.state, self.rng.as_mut()) {
            self.handle_random_event(event, now_utc);
        }

        engine::roll_history(&mut self.state, self.rng.as_mut());

        self.log.push(LogEntry {
            timestamp: now_utc,
            temperature_c: self.state.temperature_c,
            battery_level_percent: self.state.battery_level_percent,
            compressor: self.state.compressor,
            power_source: self.state.power_source,
        });
        self.ticks += 1;

        debug_assert!(self.state.check_invariants().is_ok());
        debug!(
            tick = self.ticks,
            temperature_c = self.state.temperature_c,
            change_c = change,
            battery_level_percent = self.state.battery_level_percent,
            power_source = %self.state.power_source,
            compressor = self.state.compressor,
            "simulation tick"
        );

        self.publish_snapshot();
    }

    fn handle_random_event(&mut self, event: RandomEvent, now: DateTime<Utc>) {
        match event {
            RandomEvent::DoorToggled { open: true } => {
                self.emit(Severity::Warning, "Door opened");
                self.schedule_door_check(now);
            }
            RandomEvent::DoorToggled { open: false } => {
                self.emit(Severity::Success, "Door closed");
            }
            RandomEvent::ConnectionToggled { online: true } => {
                self.emit(Severity::Success, "Connection restored");
            }
            RandomEvent::ConnectionToggled { online: false } => {
                self.emit(Severity::Error, "Connection lost");
            }
            RandomEvent::FaultRaised(fault) => {
                self.emit(Severity::Error, format!("Error: {fault}"));
            }
            RandomEvent::FaultCleared(fault) => {
                self.emit(Severity::Success, format!("Error cleared: {fault}"));
            }
        }
    }

    /// Queues a "door open too long" check. Earlier checks are left in place;
    /// each re-reads the door state when it fires.
    pub(super) fn schedule_door_check(&mut self, now: DateTime<Utc>) -> TimerHandle {
        self.timers
            .schedule(now + self.settings.door_alarm_delay, DeferredTask::DoorAjarCheck)
    }

    pub(super) fn schedule(&mut self, due: DateTime<Utc>, task: DeferredTask) -> TimerHandle {
        self.timers.schedule(due, task)
    }

    /// Fires every deferred timer due by the clock's current time.
    /// Returns how many fired.
    pub fn fire_due_timers(&mut self) -> usize {
        let due = self.timers.take_due(self.clock.now_utc());
        if due.is_empty() {
            return 0;
        }

        for (_, task) in &due {
            match task {
                DeferredTask::OverrideExpiry => {
                    self.state.override_mode = false;
                    info!("override mode ended");
                    self.emit(Severity::Success, "Override mode ended");
                }
                DeferredTask::DoorAjarCheck => {
                    if self.state.door_open {
                        self.emit(Severity::Warning, "Door open too long");
                    }
                }
            }
        }

        self.publish_snapshot();
        due.len()
    }

    pub fn cancel_timer(&mut self, handle: TimerHandle) -> bool {
        self.timers.cancel(handle)
    }

    pub fn pending_timers(&self) -> Vec<(DateTime<Utc>, DeferredTask)> {
        self.timers.pending().collect()
    }

    /// Sends an alert to subscribers and mirrors it to the log.
    pub(super) fn emit(&self, severity: Severity, message: impl Into<String>) {
        let event = AlertEvent::new(message, severity, self.clock.now_utc());
        match severity {
            Severity::Info | Severity::Success => info!(%severity, message = %event.message, "alert"),
            Severity::Warning => warn!(%severity, message = %event.message, "alert"),
            Severity::Error => error!(%severity, message = %event.message, "alert"),
        }
        // no subscribers is fine
        let _ = self.alerts.send(event);
    }

    pub(super) fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.state.clone());
    }

    pub fn snapshot(&self) -> FridgeState {
        self.state.clone()
    }

    pub fn state(&self) -> &FridgeState {
        &self.state
    }

    /// Data log, oldest first
    pub fn log(&self) -> Vec<LogEntry> {
        self.log.to_vec()
    }

    pub fn status(&self) -> StatusReport {
        StatusReport::from_state(&self.state)
    }

    pub fn export_summary(&self) -> ExportSummary {
        ExportSummary::from_state(&self.state, self.clock.now_utc())
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertEvent> {
        self.alerts.subscribe()
    }

    pub fn watch_snapshots(&self) -> watch::Receiver<FridgeState> {
        self.snapshots.subscribe()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
