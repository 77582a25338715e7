/*!
 * Component Memory Snapshot
 * Bounded reading window with baseline, last and peak values
 */

use crate::core::types::{Megabytes, Timestamp};
use serde::Serialize;
use std::collections::VecDeque;

/// Memory history of one tracked component instance
///
/// Invariants: `peak_memory >= max(readings)` and `peak_memory >= baseline_memory`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    pub baseline_memory: Megabytes,
    pub previous_memory: Megabytes,
    pub peak_memory: Megabytes,
    readings: VecDeque<Megabytes>,
    #[serde(skip)]
    window: usize,
    pub last_update_time: Timestamp,
}

impl MemorySnapshot {
    /// Start a snapshot at `baseline`, which also becomes the first reading
    pub fn new(baseline: Megabytes, window: usize, now: Timestamp) -> Self {
        let window = window.max(1);
        let mut readings = VecDeque::with_capacity(window + 1);
        readings.push_back(baseline);
        Self {
            baseline_memory: baseline,
            previous_memory: baseline,
            peak_memory: baseline,
            readings,
            window,
            last_update_time: now,
        }
    }

    /// Append an accepted reading, evicting the oldest past the window
    pub fn record(&mut self, reading: Megabytes, now: Timestamp) {
        self.readings.push_back(reading);
        while self.readings.len() > self.window {
            self.readings.pop_front();
        }
        self.previous_memory = reading;
        self.peak_memory = self.peak_memory.max(reading);
        self.last_update_time = now;

        debug_assert!(self.readings.iter().all(|r| *r <= self.peak_memory));
    }

    /// Pin the final value at unmount without touching the trend window
    pub fn settle(&mut self, final_memory: Megabytes, now: Timestamp) {
        self.previous_memory = final_memory;
        self.peak_memory = self.peak_memory.max(final_memory);
        self.last_update_time = now;
    }

    #[inline]
    pub fn readings(&self) -> &VecDeque<Megabytes> {
        &self.readings
    }

    /// Copy of the window, oldest first
    pub fn readings_vec(&self) -> Vec<Megabytes> {
        self.readings.iter().copied().collect()
    }

    #[inline]
    pub fn first_reading(&self) -> Option<Megabytes> {
        self.readings.front().copied()
    }

    #[inline]
    pub fn window(&self) -> usize {
        self.window
    }

    /// Growth since mount, judged on the last accepted reading
    #[inline]
    pub fn total_change(&self) -> Megabytes {
        self.previous_memory - self.baseline_memory
    }
}
