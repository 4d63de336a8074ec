//! # Fridge Simulation Module
//!
//! Fabricates plausible readings for a solar-powered refrigeration unit.
//!
//! ## Components
//!
//! - **Environment**: wall clock and the time-of-day solar curve
//! - **Random**: injectable random source used by every stochastic rule
//! - **Timers**: deferred one-shots (override expiry, door-ajar warning)
//! - **Engine**: the per-tick transition rules
//! - **Simulator**: owns the state and runs ticks, timers and actions
//! - **Control**: user actions (power, override, energy saver, door, setpoint)
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use solar_fridge_sim::config::FridgeConfig;
//! use solar_fridge_sim::simulation::{
//!     FridgeSimulator, SimulatorSettings, StdRngSource, SystemClock,
//! };
//!
//! let mut sim = FridgeSimulator::new(
//!     &FridgeConfig::default(),
//!     SimulatorSettings::default(),
//!     Arc::new(SystemClock),
//!     Box::new(StdRngSource::new(Some(42))),
//! );
//!
//! sim.tick();
//! sim.toggle_power().unwrap();
//! assert_eq!(sim.log().len(), 1);
//! ```

pub mod control;
pub mod engine;
pub mod environment;
pub mod random;
pub mod simulator;
pub mod timers;

pub use control::ControlError;
pub use engine::RandomEvent;
pub use environment::{solar_intensity, Clock, ManualClock, SystemClock};
pub use random::{RandomSource, SequenceSource, StdRngSource};
pub use simulator::{FridgeSimulator, SimulatorSettings};
pub use timers::{DeferredTask, TimerHandle, TimerQueue};
