use anyhow::{ensure, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::domain::fridge::{
    BATTERY_MAX_PERCENT, BATTERY_MIN_PERCENT, TEMPERATURE_MAX_C, TEMPERATURE_MIN_C,
};

/// Longest accepted override or door-alarm delay (one day)
pub const MAX_TIMER_DELAY_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub simulation: SimulationConfig,
    pub fridge: FridgeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: false,
            request_timeout_secs: 10,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Period of the update engine
    pub tick_seconds: u64,
    /// How often deferred timers are checked
    pub timer_poll_millis: u64,
    pub override_duration_secs: u64,
    /// Delay before the door-open-too-long warning
    pub door_alarm_secs: u64,
    pub log_capacity: usize,
    pub alert_channel_capacity: usize,
    /// Fixed seed for reproducible runs; entropy when unset
    pub random_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 3,
            timer_poll_millis: 250,
            override_duration_secs: 20,
            door_alarm_secs: 120,
            log_capacity: 100,
            alert_channel_capacity: 256,
            random_seed: None,
        }
    }
}

/// Initial readings of a freshly started fridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FridgeConfig {
    pub temperature_c: f64,
    pub setpoint_c: f64,
    pub battery_level_percent: f64,
    pub compressor_cycles: u64,
}

impl Default for FridgeConfig {
    fn default() -> Self {
        Self {
            temperature_c: 4.5,
            setpoint_c: 4.0,
            battery_level_percent: 87.32,
            compressor_cycles: 42,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("FRIDGE__").split("__"));
        let cfg: Config = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let sim = &self.simulation;
        ensure!(sim.tick_seconds > 0, "simulation.tick_seconds must be positive");
        ensure!(sim.timer_poll_millis > 0, "simulation.timer_poll_millis must be positive");
        ensure!(sim.log_capacity > 0, "simulation.log_capacity must be positive");
        ensure!(
            sim.override_duration_secs <= MAX_TIMER_DELAY_SECS,
            "simulation.override_duration_secs must be at most {MAX_TIMER_DELAY_SECS}"
        );
        ensure!(
            sim.door_alarm_secs <= MAX_TIMER_DELAY_SECS,
            "simulation.door_alarm_secs must be at most {MAX_TIMER_DELAY_SECS}"
        );
        ensure!(
            sim.alert_channel_capacity > 0,
            "simulation.alert_channel_capacity must be positive"
        );

        let fridge = &self.fridge;
        ensure!(
            fridge.setpoint_c.is_finite(),
            "fridge.setpoint_c must be a finite number"
        );
        ensure!(
            fridge.temperature_c.is_finite()
                && (TEMPERATURE_MIN_C..=TEMPERATURE_MAX_C).contains(&fridge.temperature_c),
            "fridge.temperature_c must be within [{TEMPERATURE_MIN_C}, {TEMPERATURE_MAX_C}]"
        );
        ensure!(
            fridge.battery_level_percent.is_finite()
                && (BATTERY_MIN_PERCENT..=BATTERY_MAX_PERCENT)
                    .contains(&fridge.battery_level_percent),
            "fridge.battery_level_percent must be within [{BATTERY_MIN_PERCENT}, {BATTERY_MAX_PERCENT}]"
        );
        Ok(())
    }
}
