use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use super::FridgeController;
use crate::config::SimulationConfig;

/// Periodic task configuration
#[derive(Debug, Clone)]
pub struct PeriodicTaskConfig {
    /// Update engine period
    pub tick_interval: Duration,
    /// How often pending deferred timers are checked
    pub timer_poll_interval: Duration,
}

impl Default for PeriodicTaskConfig {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

impl From<&SimulationConfig> for PeriodicTaskConfig {
    fn from(cfg: &SimulationConfig) -> Self {
        Self {
            tick_interval: Duration::from_secs(cfg.tick_seconds.max(1)),
            timer_poll_interval: Duration::from_millis(cfg.timer_poll_millis.max(1)),
        }
    }
}

/// Task status tracking
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TaskStatus {
    pub last_run: Option<DateTime<Utc>>,
    /// Completed ticks, or fired timers for the timer task
    pub run_count: u64,
}

/// Drives the simulator: one task for ticks, one for deferred timers.
/// Both go through the controller's lock, so they never overlap.
pub struct TaskScheduler {
    config: PeriodicTaskConfig,
    controller: Arc<FridgeController>,
    tick_status: Arc<RwLock<TaskStatus>>,
    timer_status: Arc<RwLock<TaskStatus>>,
}

impl TaskScheduler {
    pub fn new(controller: Arc<FridgeController>) -> Self {
        Self::with_config(controller, PeriodicTaskConfig::default())
    }

    pub fn with_config(controller: Arc<FridgeController>, config: PeriodicTaskConfig) -> Self {
        Self {
            config,
            controller,
            tick_status: Arc::new(RwLock::new(TaskStatus::default())),
            timer_status: Arc::new(RwLock::new(TaskStatus::default())),
        }
    }

    /// Start all periodic tasks. They run for the process lifetime.
    pub fn start(self: Arc<Self>) {
        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_tick_task().await;
        });

        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.run_timer_task().await;
        });

        info!(
            tick_ms = self.config.tick_interval.as_millis() as u64,
            timer_poll_ms = self.config.timer_poll_interval.as_millis() as u64,
            "simulation tasks started"
        );
    }

    /// First tick fires immediately, then every `tick_interval`.
    async fn run_tick_task(&self) {
        let mut interval = interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            self.controller.tick();

            let mut status = self.tick_status.write().await;
            status.last_run = Some(Utc::now());
            status.run_count += 1;
        }
    }

    async fn run_timer_task(&self) {
        let mut interval = interval(self.config.timer_poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let fired = self.controller.fire_due_timers();
            if fired == 0 {
                continue;
            }

            debug!(fired, "deferred timers fired");
            let mut status = self.timer_status.write().await;
            status.last_run = Some(Utc::now());
            status.run_count += fired as u64;
        }
    }

    pub async fn get_tick_status(&self) -> TaskStatus {
        self.tick_status.read().await.clone()
    }

    pub async fn get_timer_status(&self) -> TaskStatus {
        self.timer_status.read().await.clone()
    }
}
