pub mod scheduler;

use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::info;

use crate::config::Config;
use crate::domain::{AlertEvent, ExportSummary, FridgeState, LogEntry, StatusReport};
use crate::simulation::{
    ControlError, FridgeSimulator, SimulatorSettings, StdRngSource, SystemClock,
};

pub use scheduler::{PeriodicTaskConfig, TaskScheduler, TaskStatus};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub controller: Arc<FridgeController>,
    pub scheduler: Arc<TaskScheduler>,
}

impl AppState {
    pub fn new(cfg: Config) -> Result<Self> {
        cfg.validate()?;

        let simulator = FridgeSimulator::new(
            &cfg.fridge,
            SimulatorSettings::from(&cfg.simulation),
            Arc::new(SystemClock),
            Box::new(StdRngSource::new(cfg.simulation.random_seed)),
        );
        let controller = Arc::new(FridgeController::new(simulator));
        let scheduler = Arc::new(TaskScheduler::with_config(
            controller.clone(),
            PeriodicTaskConfig::from(&cfg.simulation),
        ));

        Ok(Self {
            cfg,
            controller,
            scheduler,
        })
    }
}

pub fn spawn_controller_tasks(state: &AppState) {
    info!(
        tick_seconds = state.cfg.simulation.tick_seconds,
        "starting simulation tasks"
    );
    state.scheduler.clone().start();
}

/// Serializes all access to the simulator.
///
/// Ticks, control actions and timer firings each take the lock for the
/// duration of one synchronous call; nothing awaits while holding it.
pub struct FridgeController {
    sim: Mutex<FridgeSimulator>,
}

impl FridgeController {
    pub fn new(sim: FridgeSimulator) -> Self {
        Self {
            sim: Mutex::new(sim),
        }
    }

    pub fn tick(&self) {
        self.sim.lock().tick();
    }

    pub fn fire_due_timers(&self) -> usize {
        self.sim.lock().fire_due_timers()
    }

    pub fn ticks(&self) -> u64 {
        self.sim.lock().ticks()
    }

    pub fn snapshot(&self) -> FridgeState {
        self.sim.lock().snapshot()
    }

    pub fn log(&self) -> Vec<LogEntry> {
        self.sim.lock().log()
    }

    pub fn status(&self) -> (FridgeState, StatusReport) {
        let sim = self.sim.lock();
        (sim.snapshot(), sim.status())
    }

    pub fn export_summary(&self) -> ExportSummary {
        self.sim.lock().export_summary()
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertEvent> {
        self.sim.lock().subscribe_alerts()
    }

    pub fn watch_snapshots(&self) -> watch::Receiver<FridgeState> {
        self.sim.lock().watch_snapshots()
    }

    pub fn set_setpoint(&self, value: f64) -> Result<FridgeState, ControlError> {
        let mut sim = self.sim.lock();
        sim.set_setpoint(value)?;
        Ok(sim.snapshot())
    }

    pub fn toggle_power(&self) -> Result<FridgeState, ControlError> {
        let mut sim = self.sim.lock();
        sim.toggle_power()?;
        Ok(sim.snapshot())
    }

    pub fn activate_override(&self) -> FridgeState {
        let mut sim = self.sim.lock();
        sim.activate_override();
        sim.snapshot()
    }

    pub fn toggle_energy_saver(&self) -> FridgeState {
        let mut sim = self.sim.lock();
        sim.toggle_energy_saver();
        sim.snapshot()
    }

    pub fn toggle_door(&self) -> FridgeState {
        let mut sim = self.sim.lock();
        sim.toggle_door();
        sim.snapshot()
    }
}
