//! # Deferred One-Shot Timers
//!
//! Timed effects (override expiry, door-ajar warning) are queued here rather
//! than spawned as background tasks, and fired by whoever owns the simulator,
//! through the same exclusive path as `tick()`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Effect to run when a timer comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferredTask {
    /// Leave override mode
    OverrideExpiry,
    /// Warn if the door is still open
    DoorAjarCheck,
}

/// Cancellation handle returned by [`TimerQueue::schedule`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: BTreeMap<(DateTime<Utc>, u64), DeferredTask>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: DateTime<Utc>, task: DeferredTask) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert((due, id), task);
        TimerHandle(id)
    }

    /// Returns `false` if the timer already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let key = self.pending.keys().find(|(_, id)| *id == handle.0).copied();
        match key {
            Some(key) => self.pending.remove(&key).is_some(),
            None => false,
        }
    }

    /// Removes and returns every task due at or before `now`, earliest first.
    /// Timers due at the same instant fire in scheduling order.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<(TimerHandle, DeferredTask)> {
        let mut due = Vec::new();
        while let Some(entry) = self.pending.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((_, id), task) = entry.remove_entry();
            due.push((TimerHandle(id), task));
        }
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = (DateTime<Utc>, DeferredTask)> + '_ {
        self.pending.iter().map(|((due, _), task)| (*due, *task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_nothing_fires_early() {
        let mut q = TimerQueue::new();
        q.schedule(t0() + Duration::seconds(20), DeferredTask::OverrideExpiry);
        assert!(q.take_due(t0() + Duration::seconds(19)).is_empty());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_fires_in_due_order() {
        let mut q = TimerQueue::new();
        let door = q.schedule(t0() + Duration::seconds(120), DeferredTask::DoorAjarCheck);
        let over = q.schedule(t0() + Duration::seconds(20), DeferredTask::OverrideExpiry);

        let fired = q.take_due(t0() + Duration::seconds(200));
        assert_eq!(
            fired,
            vec![
                (over, DeferredTask::OverrideExpiry),
                (door, DeferredTask::DoorAjarCheck)
            ]
        );
        assert!(q.is_empty());
    }

    #[test]
    fn test_same_instant_keeps_schedule_order() {
        let mut q = TimerQueue::new();
        let due = t0() + Duration::seconds(5);
        let a = q.schedule(due, DeferredTask::DoorAjarCheck);
        let b = q.schedule(due, DeferredTask::OverrideExpiry);
        let fired: Vec<_> = q.take_due(due).into_iter().map(|(h, _)| h).collect();
        assert_eq!(fired, vec![a, b]);
    }

    #[test]
    fn test_cancel() {
        let mut q = TimerQueue::new();
        let h = q.schedule(t0(), DeferredTask::DoorAjarCheck);
        assert!(q.cancel(h));
        assert!(!q.cancel(h));
        assert!(q.take_due(t0()).is_empty());
    }

    #[test]
    fn test_pending_is_ordered_by_due_time() {
        let mut q = TimerQueue::new();
        q.schedule(t0() + Duration::seconds(120), DeferredTask::DoorAjarCheck);
        q.schedule(t0() + Duration::seconds(20), DeferredTask::OverrideExpiry);
        assert_eq!(
            q.pending().collect::<Vec<_>>(),
            vec![
                (t0() + Duration::seconds(20), DeferredTask::OverrideExpiry),
                (t0() + Duration::seconds(120), DeferredTask::DoorAjarCheck),
            ]
        );
    }
}
