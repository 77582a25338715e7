/*!
 * Memory Types
 * Normalized memory snapshots in whole megabytes
 */

use crate::core::types::Megabytes;
use serde::{Deserialize, Serialize};

/// One reading of system and process memory, in MB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryInfo {
    pub total_memory: Megabytes,
    pub available_memory: Megabytes,
    pub used_memory: Megabytes,
    pub app_memory: Megabytes,
    pub is_low_memory: bool,
    pub low_memory_threshold: Megabytes,
}

impl MemoryInfo {
    /// Build from system totals; used memory is derived as total minus available
    pub fn new(
        total_memory: Megabytes,
        available_memory: Megabytes,
        app_memory: Megabytes,
        low_memory_threshold: Megabytes,
    ) -> Self {
        Self {
            total_memory,
            available_memory,
            used_memory: total_memory - available_memory,
            app_memory,
            is_low_memory: available_memory <= low_memory_threshold,
            low_memory_threshold,
        }
    }

    /// Clamp provider output into a consistent shape
    ///
    /// All figures are non-negative, available never exceeds total and used
    /// never exceeds total.
    pub fn normalized(self) -> Self {
        let total_memory = self.total_memory.max(0);
        let available_memory = self.available_memory.clamp(0, total_memory);
        Self {
            total_memory,
            available_memory,
            used_memory: self.used_memory.clamp(0, total_memory),
            app_memory: self.app_memory.max(0),
            is_low_memory: self.is_low_memory,
            low_memory_threshold: self.low_memory_threshold.max(0),
        }
    }

    /// Used memory as a percentage of total
    pub fn usage_percentage(&self) -> f64 {
        if self.total_memory <= 0 {
            0.0
        } else {
            self.used_memory as f64 / self.total_memory as f64 * 100.0
        }
    }

    pub fn memory_pressure(&self) -> MemoryPressure {
        let usage = self.usage_percentage();
        if self.is_low_memory || usage >= 95.0 {
            MemoryPressure::Critical
        } else if usage >= 80.0 {
            MemoryPressure::High
        } else if usage >= 60.0 {
            MemoryPressure::Medium
        } else {
            MemoryPressure::Low
        }
    }
}

/// Memory pressure levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemoryPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MemoryPressure::Low => write!(f, "LOW"),
            MemoryPressure::Medium => write!(f, "MEDIUM"),
            MemoryPressure::High => write!(f, "HIGH"),
            MemoryPressure::Critical => write!(f, "CRITICAL"),
        }
    }
}
