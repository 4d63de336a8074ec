//! # Update Engine
//!
//! The per-tick transition rules. Each step mutates [`FridgeState`] in place
//! and draws any randomness from the supplied [`RandomSource`], in a fixed
//! order, so a scripted source reproduces a tick exactly:
//!
//! 1. battery: charge noise, then compressor demand noise (solar), or
//!    discharge noise (battery)
//! 2. random events: door, connection, fault injection or fault clearing
//! 3. history: solar input, then battery usage
//!
//! The temperature step is deterministic.

use chrono::Timelike;

use super::environment::solar_intensity;
use super::random::RandomSource;
use crate::domain::fridge::{
    BatteryHealth, FaultKind, FridgeState, History, PowerSource, TempTrend, BATTERY_MAX_PERCENT,
    BATTERY_MIN_PERCENT, HISTORY_DAYS, TEMPERATURE_MAX_C, TEMPERATURE_MIN_C,
};

/// Passive drift towards the setpoint per tick (°C)
pub const DRIFT_STEP_C: f64 = 0.2;
/// Dead band around the setpoint with no passive drift (°C)
pub const DRIFT_DEAD_BAND_C: f64 = 0.1;
/// Compressor contribution when below setpoint (°C)
pub const COMPRESSOR_WARM_STEP_C: f64 = 0.1;
/// Compressor contribution when at/above setpoint (°C)
pub const COMPRESSOR_COOL_STEP_C: f64 = -0.3;
/// Heat gained per tick with the door open (°C)
pub const DOOR_OPEN_GAIN_C: f64 = 0.5;
pub const ENERGY_SAVER_FACTOR: f64 = 0.5;

pub const DOOR_TOGGLE_PROBABILITY: f64 = 0.05;
pub const CONNECTION_TOGGLE_PROBABILITY: f64 = 0.03;
pub const FAULT_PROBABILITY: f64 = 0.02;
pub const FAULT_CLEAR_PROBABILITY: f64 = 0.3;

/// Outcome of the random-event pass, in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomEvent {
    DoorToggled { open: bool },
    ConnectionToggled { online: bool },
    FaultRaised(FaultKind),
    FaultCleared(FaultKind),
}

/// Recomputes solar intensity for `now` and derives the power source.
pub fn update_environment<T: Timelike>(state: &mut FridgeState, now: &T) {
    state.solar_intensity = solar_intensity(now);
    state.power_source = PowerSource::from_intensity(state.solar_intensity);
}

/// Temperature change for the current tick, before clamping.
pub fn temperature_change(state: &FridgeState) -> f64 {
    let diff = state.setpoint_c - state.temperature_c;
    let mut change = 0.0;

    if diff.abs() > DRIFT_DEAD_BAND_C {
        change += if diff > 0.0 { DRIFT_STEP_C } else { -DRIFT_STEP_C };
    }

    if state.compressor || state.override_mode {
        change += if diff > 0.0 {
            COMPRESSOR_WARM_STEP_C
        } else {
            COMPRESSOR_COOL_STEP_C
        };
    }

    if state.door_open {
        change += DOOR_OPEN_GAIN_C;
    }

    // applied once to the total, not per term
    if state.energy_saver && state.compressor {
        change *= ENERGY_SAVER_FACTOR;
    }

    change
}

/// Applies the temperature step and sets the trend. Returns the raw change.
pub fn update_temperature(state: &mut FridgeState) -> f64 {
    let change = temperature_change(state);
    state.temperature_c =
        (state.temperature_c + change).clamp(TEMPERATURE_MIN_C, TEMPERATURE_MAX_C);
    state.temp_trend = TempTrend::from_change(change);
    change
}

/// Charges or discharges the battery and re-derives its health.
pub fn update_battery(state: &mut FridgeState, rng: &mut dyn RandomSource) -> BatteryHealth {
    match state.power_source {
        PowerSource::Solar => {
            let charge = state.solar_intensity * rng.range(10.0, 15.0);
            state.charge_rate_w = charge;

            if state.compressor {
                // solar feeds the compressor first
                let needed = rng.range(5.0, 8.0);
                if charge >= needed {
                    state.battery_level_percent += (charge - needed) / 20.0;
                } else {
                    state.battery_level_percent -= (needed - charge) / 10.0;
                }
            } else {
                state.battery_level_percent += charge / 15.0;
            }
        }
        PowerSource::Battery => {
            state.charge_rate_w = 0.0;
            if state.compressor {
                state.battery_level_percent -= rng.range(2.0, 3.0);
            }
        }
    }

    state.battery_level_percent = state
        .battery_level_percent
        .clamp(BATTERY_MIN_PERCENT, BATTERY_MAX_PERCENT);
    state.battery_health = BatteryHealth::from_level(state.battery_level_percent);
    state.battery_health
}

/// Independent per-tick draws for door, connectivity and fault changes.
pub fn inject_random_events(
    state: &mut FridgeState,
    rng: &mut dyn RandomSource,
) -> Vec<RandomEvent> {
    let mut events = Vec::new();

    if rng.chance(DOOR_TOGGLE_PROBABILITY) {
        state.door_open = !state.door_open;
        events.push(RandomEvent::DoorToggled {
            open: state.door_open,
        });
    }

    if rng.chance(CONNECTION_TOGGLE_PROBABILITY) {
        state.online = !state.online;
        events.push(RandomEvent::ConnectionToggled {
            online: state.online,
        });
    }

    match state.error {
        None => {
            if rng.chance(FAULT_PROBABILITY) {
                let fault = FaultKind::ALL[rng.index(FaultKind::ALL.len())];
                state.error = Some(fault);
                events.push(RandomEvent::FaultRaised(fault));
            }
        }
        Some(fault) => {
            if rng.chance(FAULT_CLEAR_PROBABILITY) {
                state.error = None;
                events.push(RandomEvent::FaultCleared(fault));
            }
        }
    }

    events
}

/// Daily solar input sample (Wh)
fn sample_solar_input(rng: &mut dyn RandomSource) -> f64 {
    (300.0 * rng.range(0.8, 1.2)).round()
}

/// Shifts every history window and appends this tick's values.
pub fn roll_history(state: &mut FridgeState, rng: &mut dyn RandomSource) {
    let history = &mut state.history;
    History::shift_push(&mut history.temperature, state.temperature_c);
    History::shift_push(&mut history.solar_input, sample_solar_input(rng));

    let usage = match state.power_source {
        PowerSource::Battery => rng.range(150.0, 250.0),
        PowerSource::Solar => rng.range(50.0, 100.0),
    };
    History::shift_push(&mut history.battery_usage, usage.round());
}

/// Synthesizes a plausible seven-day history for a fresh simulator.
pub fn initial_history(rng: &mut dyn RandomSource) -> History {
    let mut history = History {
        temperature: [0.0; HISTORY_DAYS],
        solar_input: [0.0; HISTORY_DAYS],
        battery_usage: [0.0; HISTORY_DAYS],
    };

    // slot 0 is six days ago, slot 6 is today
    for slot in 0..HISTORY_DAYS {
        let days_ago = (HISTORY_DAYS - 1 - slot) as f64;
        let base = 4.0 + (days_ago * 0.5).sin() * 2.0;
        history.temperature[slot] = base + rng.range(-0.75, 0.75);

        let solar_multiplier = rng.range(0.8, 1.2);
        history.solar_input[slot] = (300.0 * solar_multiplier).round();
        history.battery_usage[slot] = (150.0 * (1.0 - solar_multiplier * 0.7)).round();
    }

    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::random::SequenceSource;
    use chrono::{NaiveTime, TimeZone, Utc};
    use rstest::rstest;

    fn state() -> FridgeState {
        FridgeState {
            temperature_c: 4.5,
            setpoint_c: 4.0,
            battery_level_percent: 50.0,
            battery_health: BatteryHealth::Good,
            charge_rate_w: 0.0,
            power_source: PowerSource::Solar,
            compressor: false,
            override_mode: false,
            energy_saver: false,
            door_open: false,
            online: true,
            error: None,
            temp_trend: TempTrend::Steady,
            solar_intensity: 1.0,
            compressor_cycles: 0,
            history: History {
                temperature: [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0],
                solar_input: [300.0; HISTORY_DAYS],
                battery_usage: [100.0; HISTORY_DAYS],
            },
            last_update: Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap(),
        }
    }

    #[rstest]
    // passive drift only
    #[case(4.5, 4.0, false, false, false, false, -0.2)]
    #[case(3.0, 4.0, false, false, false, false, 0.2)]
    #[case(4.05, 4.0, false, false, false, false, 0.0)]
    // compressor: asymmetric
    #[case(4.5, 4.0, true, false, false, false, -0.5)]
    #[case(3.0, 4.0, true, false, false, false, 0.3)]
    #[case(4.0, 4.0, true, false, false, false, -0.3)]
    // override behaves like the compressor for drift
    #[case(4.5, 4.0, false, true, false, false, -0.5)]
    // door adds heat
    #[case(4.5, 4.0, false, false, true, false, 0.3)]
    // energy saver halves the total, only with the compressor running
    #[case(4.5, 4.0, true, false, true, true, 0.0)]
    #[case(6.0, 4.0, true, false, false, true, -0.25)]
    #[case(6.0, 4.0, false, true, false, true, -0.5)]
    fn test_temperature_change(
        #[case] temperature: f64,
        #[case] setpoint: f64,
        #[case] compressor: bool,
        #[case] override_mode: bool,
        #[case] door_open: bool,
        #[case] energy_saver: bool,
        #[case] expected: f64,
    ) {
        let mut s = state();
        s.temperature_c = temperature;
        s.setpoint_c = setpoint;
        s.compressor = compressor;
        s.override_mode = override_mode;
        s.door_open = door_open;
        s.energy_saver = energy_saver;
        assert!((temperature_change(&s) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_update_temperature_clamps_and_sets_trend() {
        let mut s = state();
        s.temperature_c = 19.9;
        s.setpoint_c = 30.0;
        s.door_open = true;
        let change = update_temperature(&mut s);
        assert!((change - 0.7).abs() < 1e-9);
        assert_eq!(s.temperature_c, TEMPERATURE_MAX_C);
        assert_eq!(s.temp_trend, TempTrend::Rising);
    }

    #[test]
    fn test_update_temperature_falling() {
        let mut s = state();
        update_temperature(&mut s);
        assert!((s.temperature_c - 4.3).abs() < 1e-9);
        assert_eq!(s.temp_trend, TempTrend::Falling);
    }

    #[test]
    fn test_update_environment_derives_source() {
        let mut s = state();
        update_environment(&mut s, &NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert_eq!(s.power_source, PowerSource::Solar);

        update_environment(&mut s, &NaiveTime::from_hms_opt(23, 0, 0).unwrap());
        assert_eq!(s.solar_intensity, 0.0);
        assert_eq!(s.power_source, PowerSource::Battery);
    }

    #[test]
    fn test_solar_charging_without_compressor() {
        let mut s = state();
        // charge = 1.0 * (10 + 0.5*5) = 12.5 -> +12.5/15
        let mut rng = SequenceSource::constant(0.5);
        update_battery(&mut s, &mut rng);
        assert!((s.charge_rate_w - 12.5).abs() < 1e-9);
        assert!((s.battery_level_percent - (50.0 + 12.5 / 15.0)).abs() < 1e-9);
        assert_eq!(rng.draws(), 1);
    }

    #[test]
    fn test_solar_surplus_with_compressor() {
        let mut s = state();
        s.compressor = true;
        // charge = 10, needed = 5
        let mut rng = SequenceSource::constant(0.0);
        update_battery(&mut s, &mut rng);
        assert!((s.battery_level_percent - (50.0 + 5.0 / 20.0)).abs() < 1e-9);
        assert_eq!(rng.draws(), 2);
    }

    #[test]
    fn test_solar_deficit_with_compressor() {
        let mut s = state();
        s.compressor = true;
        s.solar_intensity = 0.4;
        // charge = 0.4 * 10 = 4, needed = 5 -> -(1/10)
        let mut rng = SequenceSource::constant(0.0);
        update_battery(&mut s, &mut rng);
        assert!((s.battery_level_percent - 49.9).abs() < 1e-9);
    }

    #[test]
    fn test_battery_discharge_floors_at_zero() {
        let mut s = state();
        s.power_source = PowerSource::Battery;
        s.solar_intensity = 0.0;
        s.compressor = true;
        s.battery_level_percent = 1.5;
        s.charge_rate_w = 3.0;
        let health = update_battery(&mut s, &mut SequenceSource::constant(0.0));
        assert_eq!(s.battery_level_percent, 0.0);
        assert_eq!(s.charge_rate_w, 0.0);
        assert_eq!(health, BatteryHealth::Critical);
    }

    #[test]
    fn test_battery_idle_on_battery_power_draws_nothing() {
        let mut s = state();
        s.power_source = PowerSource::Battery;
        let mut rng = SequenceSource::constant(0.0);
        update_battery(&mut s, &mut rng);
        assert_eq!(s.battery_level_percent, 50.0);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_battery_charge_caps_at_full() {
        let mut s = state();
        s.battery_level_percent = 99.9;
        let health = update_battery(&mut s, &mut SequenceSource::constant(0.9));
        assert_eq!(s.battery_level_percent, 100.0);
        assert_eq!(health, BatteryHealth::Full);
    }

    #[test]
    fn test_no_random_events_on_high_draws() {
        let mut s = state();
        let mut rng = SequenceSource::constant(0.9);
        assert!(inject_random_events(&mut s, &mut rng).is_empty());
        // door, connection, fault
        assert_eq!(rng.draws(), 3);
    }

    #[test]
    fn test_all_random_events_on_zero_draws() {
        let mut s = state();
        let mut rng = SequenceSource::constant(0.0);
        let events = inject_random_events(&mut s, &mut rng);
        assert_eq!(
            events,
            vec![
                RandomEvent::DoorToggled { open: true },
                RandomEvent::ConnectionToggled { online: false },
                RandomEvent::FaultRaised(FaultKind::SensorFault),
            ]
        );
        assert!(s.door_open);
        assert!(!s.online);
        assert_eq!(s.error, Some(FaultKind::SensorFault));
    }

    #[test]
    fn test_fault_choice_is_uniform_index() {
        let mut s = state();
        // door, connection skip; fault fires; pick 0.8 -> index 3
        let mut rng = SequenceSource::new([0.9, 0.9, 0.01, 0.8]);
        let events = inject_random_events(&mut s, &mut rng);
        assert_eq!(events, vec![RandomEvent::FaultRaised(FaultKind::SolarRegulatorOffline)]);
    }

    #[test]
    fn test_active_fault_clears() {
        let mut s = state();
        s.error = Some(FaultKind::BatteryCommError);
        let mut rng = SequenceSource::new([0.9, 0.9, 0.29]);
        let events = inject_random_events(&mut s, &mut rng);
        assert_eq!(events, vec![RandomEvent::FaultCleared(FaultKind::BatteryCommError)]);
        assert_eq!(s.error, None);
    }

    #[test]
    fn test_active_fault_is_not_replaced() {
        let mut s = state();
        s.error = Some(FaultKind::BatteryCommError);
        let mut rng = SequenceSource::new([0.9, 0.9, 0.5]);
        assert!(inject_random_events(&mut s, &mut rng).is_empty());
        assert_eq!(s.error, Some(FaultKind::BatteryCommError));
    }

    #[test]
    fn test_roll_history_on_solar() {
        let mut s = state();
        s.temperature_c = 4.3;
        roll_history(&mut s, &mut SequenceSource::constant(0.5));
        assert_eq!(s.history.temperature, [2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 4.3]);
        // 300 * 1.0
        assert_eq!(s.history.solar_input[HISTORY_DAYS - 1], 300.0);
        // 50 + 25
        assert_eq!(s.history.battery_usage[HISTORY_DAYS - 1], 75.0);
    }

    #[test]
    fn test_roll_history_on_battery() {
        let mut s = state();
        s.power_source = PowerSource::Battery;
        roll_history(&mut s, &mut SequenceSource::constant(0.0));
        assert_eq!(s.history.solar_input[HISTORY_DAYS - 1], 240.0);
        assert_eq!(s.history.battery_usage[HISTORY_DAYS - 1], 150.0);
    }

    #[test]
    fn test_initial_history_shape() {
        let history = initial_history(&mut SequenceSource::constant(0.5));
        // midpoint draws: no temperature noise, multiplier 1.0
        assert!((history.temperature[HISTORY_DAYS - 1] - 4.0).abs() < 1e-9);
        assert!((history.temperature[0] - (4.0 + 3.0_f64.sin() * 2.0)).abs() < 1e-9);
        assert!(history.solar_input.iter().all(|&v| v == 300.0));
        assert!(history.battery_usage.iter().all(|&v| v == 45.0));
    }
}
