/*!
 * Event System
 * Strongly-typed events pushed to the notification sink
 */

use crate::core::types::Timestamp;
use crate::diagnostics::SessionReport;
use crate::memory::{MemoryInfo, MemoryPressure};
use crate::tracking::LeakAlert;
use serde::{Deserialize, Serialize};

/// Event severity for filtering and log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Severity {
    Debug = 0,
    Info = 1,
    Warn = 2,
}

/// Event kind, the wire `type` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    MemoryUpdate,
    LeakDetected,
    SessionComplete,
}

/// Outbound event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MonitorEvent {
    /// Raw snapshot, every tick
    #[serde(rename_all = "camelCase")]
    MemoryUpdate {
        memory_info: MemoryInfo,
        timestamp: Timestamp,
    },

    /// First detection of a leak for a component in the current epoch
    LeakDetected(LeakAlert),

    /// Final report of a session
    SessionComplete(SessionReport),
}

impl MonitorEvent {
    #[inline]
    pub fn memory_update(memory_info: MemoryInfo, timestamp: Timestamp) -> Self {
        MonitorEvent::MemoryUpdate {
            memory_info,
            timestamp,
        }
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            MonitorEvent::MemoryUpdate { .. } => EventKind::MemoryUpdate,
            MonitorEvent::LeakDetected(_) => EventKind::LeakDetected,
            MonitorEvent::SessionComplete(_) => EventKind::SessionComplete,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            MonitorEvent::MemoryUpdate { memory_info, .. } => {
                if memory_info.memory_pressure() >= MemoryPressure::High {
                    Severity::Warn
                } else {
                    Severity::Debug
                }
            }
            MonitorEvent::LeakDetected(_) => Severity::Warn,
            MonitorEvent::SessionComplete(_) => Severity::Info,
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            MonitorEvent::MemoryUpdate { timestamp, .. } => *timestamp,
            MonitorEvent::LeakDetected(alert) => alert.timestamp,
            MonitorEvent::SessionComplete(report) => report.session_end,
        }
    }

    /// Check if event matches filter criteria
    #[inline]
    pub fn matches(&self, filter: &EventFilter) -> bool {
        if let Some(min_severity) = filter.min_severity {
            if self.severity() < min_severity {
                return false;
            }
        }

        if let Some(kind) = filter.kind {
            if self.kind() != kind {
                return false;
            }
        }

        true
    }
}

/// Event filter for subscribers
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub min_severity: Option<Severity>,
    pub kind: Option<EventKind>,
}

impl EventFilter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.min_severity = Some(severity);
        self
    }

    #[inline]
    pub fn kind(mut self, kind: EventKind) -> Self {
        self.kind = Some(kind);
        self
    }
}
