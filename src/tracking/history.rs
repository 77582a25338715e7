/*!
 * Component History
 * Per-name mount/unmount visits and their aggregate statistics
 */

use crate::core::types::{Megabytes, Timestamp};
use serde::{Deserialize, Serialize};

/// One mount/unmount cycle of a named component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentVisit {
    pub mount_time: Timestamp,
    pub unmount_time: Option<Timestamp>,
    pub baseline_memory: Megabytes,
    pub peak_memory: Megabytes,
    pub final_memory: Option<Megabytes>,
    pub memory_readings: Vec<Megabytes>,
}

impl ComponentVisit {
    fn open(baseline: Megabytes, now: Timestamp) -> Self {
        Self {
            mount_time: now,
            unmount_time: None,
            baseline_memory: baseline,
            peak_memory: baseline,
            final_memory: None,
            memory_readings: vec![baseline],
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.unmount_time.is_none()
    }

    pub fn record_reading(&mut self, reading: Megabytes) {
        self.memory_readings.push(reading);
        self.peak_memory = self.peak_memory.max(reading);
    }

    fn close(&mut self, final_memory: Megabytes, now: Timestamp) {
        self.unmount_time = Some(now);
        self.final_memory = Some(final_memory);
        self.peak_memory = self.peak_memory.max(final_memory);
    }

    /// Growth attributed to this visit: final memory if closed, else the peak
    #[inline]
    pub fn memory_change(&self) -> Megabytes {
        self.final_memory.unwrap_or(self.peak_memory) - self.baseline_memory
    }
}

/// All visits of one component name within a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHistory {
    pub visits: Vec<ComponentVisit>,
    pub total_mounts: u64,
}

impl ComponentHistory {
    /// Start a visit and return its index
    pub fn begin_visit(&mut self, baseline: Megabytes, now: Timestamp) -> usize {
        self.visits.push(ComponentVisit::open(baseline, now));
        self.total_mounts += 1;
        self.visits.len() - 1
    }

    pub fn visit_mut(&mut self, index: usize) -> Option<&mut ComponentVisit> {
        self.visits.get_mut(index)
    }

    /// Most recent visit that has not been closed yet
    pub fn latest_open_visit(&mut self) -> Option<&mut ComponentVisit> {
        self.visits.iter_mut().rev().find(|v| v.is_open())
    }

    /// Close the given visit, or the most recent open one when it is gone or already closed
    pub fn close_visit(
        &mut self,
        index: Option<usize>,
        final_memory: Megabytes,
        now: Timestamp,
    ) -> bool {
        let visit = match index {
            Some(i) if self.visits.get(i).map_or(false, |v| v.is_open()) => {
                self.visits.get_mut(i)
            }
            _ => self.latest_open_visit(),
        };
        match visit {
            Some(visit) => {
                visit.close(final_memory, now);
                true
            }
            None => false,
        }
    }

    pub fn summarize(&self, component_name: &str) -> ComponentSummary {
        let changes: Vec<Megabytes> = self
            .visits
            .iter()
            .map(ComponentVisit::memory_change)
            .collect();
        let total_memory_change: Megabytes = changes.iter().sum();
        let visit_count = self.visits.len();
        let average_memory_per_visit = if visit_count == 0 {
            0.0
        } else {
            total_memory_change as f64 / visit_count as f64
        };

        ComponentSummary {
            component_name: component_name.to_string(),
            visit_count,
            total_mounts: self.total_mounts,
            total_memory_change,
            average_memory_per_visit,
            max_single_visit_increase: changes.iter().copied().max().unwrap_or(0),
            visits: self.visits.clone(),
        }
    }
}

/// Session statistics for one component name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSummary {
    pub component_name: String,
    pub visit_count: usize,
    pub total_mounts: u64,
    pub total_memory_change: Megabytes,
    pub average_memory_per_visit: f64,
    pub max_single_visit_increase: Megabytes,
    pub visits: Vec<ComponentVisit>,
}
