//! # Environment Model
//!
//! Wall-clock access and the time-of-day solar curve. The environment holds
//! no state of its own beyond the clock; solar intensity is recomputed on
//! every call.

use chrono::{DateTime, Duration, FixedOffset, Local, Timelike, Utc};
use parking_lot::Mutex;
use std::f64::consts::PI;
use std::sync::Arc;

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Manually driven clock for tests and replays.
///
/// Clones share the same underlying time, so a handle kept by the test can
/// fast-forward a clock owned by the simulator.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<FixedOffset>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<FixedOffset>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock()
    }
}

/// Fractional local hour of day (hours + minutes/60)
pub fn hour_of_day<T: Timelike>(time: &T) -> f64 {
    time.hour() as f64 + time.minute() as f64 / 60.0
}

/// Solar intensity on a 0-1 scale: a half-sine from 06:00 to 18:00,
/// peaking at noon and zero at night.
pub fn solar_intensity<T: Timelike>(time: &T) -> f64 {
    let hours = hour_of_day(time);
    let intensity = ((hours - 6.0) * PI / 12.0).sin();
    intensity.clamp(0.0, 1.0)
}
