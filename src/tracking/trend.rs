/*!
 * Trend Detection
 * Sliding-window leak detection with tolerance for small dips
 *
 * Strategy: debounce readings that moved less than the minimum change, keep
 * a bounded window of the rest, and call it a leak once the window grew by
 * the significant increase without any step dropping more than the minimum
 * change. Each tracked component is reported once per epoch.
 */

use super::report::LeakAlert;
use super::snapshot::MemorySnapshot;
use crate::core::config::MonitorConfig;
use crate::core::id::NodeId;
use crate::core::limits::{
    LEAK_WINDOW_SIZE, MIN_MEMORY_CHANGE_MB, MIN_TREND_READINGS, SIGNIFICANT_INCREASE_MB,
};
use crate::core::types::{now_ms, Megabytes};
use ahash::AHashSet;
use tracing::warn;

/// Detection thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendThresholds {
    pub window_size: usize,
    pub min_change: Megabytes,
    pub significant_increase: Megabytes,
    pub min_readings: usize,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            window_size: LEAK_WINDOW_SIZE,
            min_change: MIN_MEMORY_CHANGE_MB,
            significant_increase: SIGNIFICANT_INCREASE_MB,
            min_readings: MIN_TREND_READINGS,
        }
    }
}

impl From<&MonitorConfig> for TrendThresholds {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            window_size: config.leak_window_size,
            min_change: config.min_memory_change_mb,
            significant_increase: config.significant_increase_mb,
            min_readings: config.min_trend_readings,
        }
    }
}

/// Outcome of feeding one reading to the detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// Session inactive or component already reported this epoch
    Skipped,
    /// Change smaller than the minimum; snapshot untouched
    Debounced,
    /// Reading stored, no leak
    Recorded,
    /// Reading stored and the window now shows a leak
    LeakDetected(LeakAlert),
}

impl Observation {
    /// Whether the reading was stored in the snapshot
    #[inline]
    pub fn accepted(&self) -> bool {
        matches!(self, Observation::Recorded | Observation::LeakDetected(_))
    }
}

/// Every step `(a, b)` satisfies `b >= a - tolerance`
pub fn is_increasing_trend<'a, I>(readings: I, tolerance: Megabytes) -> bool
where
    I: IntoIterator<Item = &'a Megabytes>,
{
    let mut iter = readings.into_iter();
    let Some(mut prev) = iter.next() else {
        return true;
    };
    for next in iter {
        if *next < *prev - tolerance {
            return false;
        }
        prev = next;
    }
    true
}

pub struct TrendDetector {
    thresholds: TrendThresholds,
    reported: AHashSet<NodeId>,
}

impl TrendDetector {
    pub fn new(thresholds: TrendThresholds) -> Self {
        Self {
            thresholds,
            reported: AHashSet::new(),
        }
    }

    #[inline]
    pub fn thresholds(&self) -> TrendThresholds {
        self.thresholds
    }

    /// Fresh snapshot sized to this detector's window
    pub fn new_snapshot(&self, baseline: Megabytes) -> MemorySnapshot {
        MemorySnapshot::new(baseline, self.thresholds.window_size, now_ms())
    }

    /// Feed the current memory reading of one tracked component
    pub fn observe(
        &mut self,
        key: &NodeId,
        component_name: &str,
        snapshot: &mut MemorySnapshot,
        current_memory: Megabytes,
        session_active: bool,
    ) -> Observation {
        if !session_active || self.reported.contains(key) {
            return Observation::Skipped;
        }

        let delta = current_memory - snapshot.previous_memory;
        if delta.abs() < self.thresholds.min_change {
            return Observation::Debounced;
        }

        let now = now_ms();
        snapshot.record(current_memory, now);

        if snapshot.readings().len() < self.thresholds.min_readings {
            return Observation::Recorded;
        }

        let initial_memory = snapshot.first_reading().unwrap_or(current_memory);
        let total_increase = current_memory - initial_memory;
        let increasing = is_increasing_trend(snapshot.readings(), self.thresholds.min_change);

        if total_increase < self.thresholds.significant_increase || !increasing {
            return Observation::Recorded;
        }

        self.reported.insert(key.clone());
        warn!(
            component = component_name,
            node_id = %key,
            total_increase_mb = total_increase,
            initial_mb = initial_memory,
            current_mb = current_memory,
            "memory leak detected"
        );

        Observation::LeakDetected(LeakAlert {
            component_name: component_name.to_string(),
            total_increase,
            current_memory,
            initial_memory,
            memory_readings: snapshot.readings_vec(),
            timestamp: now,
            is_first_report: true,
        })
    }

    #[inline]
    pub fn is_reported(&self, key: &NodeId) -> bool {
        self.reported.contains(key)
    }

    #[inline]
    pub fn reported_count(&self) -> usize {
        self.reported.len()
    }

    /// End the epoch for one component
    pub fn forget(&mut self, key: &NodeId) -> bool {
        self.reported.remove(key)
    }

    /// End the epoch for every component
    pub fn reset(&mut self) {
        self.reported.clear();
    }
}

impl Default for TrendDetector {
    fn default() -> Self {
        Self::new(TrendThresholds::default())
    }
}
