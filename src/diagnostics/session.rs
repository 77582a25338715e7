/*!
 * Session
 * Time-bounded monitoring window and its consolidated report
 */

use crate::core::errors::MonitorError;
use crate::core::types::{MonitorResult, Timestamp};
use crate::tracking::{ComponentSummary, HierarchyReport, LeakAlert};
use serde::{Deserialize, Serialize};

/// Monitoring session
///
/// `duration_ms` is descriptive: sessions end on an explicit stop, never on
/// their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub start_time: Timestamp,
    pub duration_ms: u64,
    pub is_active: bool,
}

impl Session {
    /// Start a session with a nominal duration in minutes
    pub fn start(duration_minutes: f64, now: Timestamp) -> MonitorResult<Self> {
        Ok(Self {
            start_time: now,
            duration_ms: duration_to_ms(duration_minutes)?,
            is_active: true,
        })
    }

    /// Time since start, 0 for a session that never started
    pub fn elapsed_ms(&self, now: Timestamp) -> u64 {
        if self.start_time == 0 {
            0
        } else {
            now.saturating_sub(self.start_time)
        }
    }

    /// Whether the nominal duration has passed
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        self.is_active && self.elapsed_ms(now) >= self.duration_ms
    }
}

/// Convert and validate a session duration
pub fn duration_to_ms(duration_minutes: f64) -> MonitorResult<u64> {
    if !duration_minutes.is_finite() || duration_minutes <= 0.0 {
        return Err(MonitorError::InvalidArgument(format!(
            "session duration must be a positive number of minutes, got {}",
            duration_minutes
        )));
    }
    Ok((duration_minutes * 60_000.0).round().max(1.0) as u64)
}

/// Consolidated result of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub session_start: Timestamp,
    pub session_end: Timestamp,
    /// Nominal duration the session was started with
    pub duration_ms: u64,
    pub elapsed_ms: u64,
    pub components_analyzed: usize,
    /// Sorted by total memory change, largest first
    pub components: Vec<ComponentSummary>,
    pub hierarchy: HierarchyReport,
    pub leaks_detected: Vec<LeakAlert>,
}

impl SessionReport {
    /// Names of components blamed by the hierarchy analysis
    pub fn suspect_names(&self) -> Vec<&str> {
        self.hierarchy
            .leaking_suspects
            .iter()
            .map(|s| s.component_name.as_str())
            .collect()
    }

    pub fn has_findings(&self) -> bool {
        !self.leaks_detected.is_empty() || !self.hierarchy.leaking_suspects.is_empty()
    }
}
