//! Capacity-bounded, append-only telemetry log.
//!
//! When full, the oldest entry is evicted first (FIFO).

use std::collections::VecDeque;

use super::events::LogEntry;

pub const DEFAULT_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct DataLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl DataLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry, returning the evicted one if the log was full.
    pub fn push(&mut self, entry: LogEntry) -> Option<LogEntry> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(entry);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for DataLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
