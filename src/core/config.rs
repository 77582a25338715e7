/*!
 * Monitor Configuration
 *
 * Runtime configuration for sampling cadence and leak thresholds
 */

use super::errors::MonitorError;
use super::limits::*;
use super::types::{Megabytes, MonitorResult};
use std::time::Duration;

/// Diagnostics engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Sampling cadence while a session runs
    pub session_tick_interval: Duration,
    /// Minimum spacing between trend evaluations
    pub evaluation_cadence: Duration,
    /// Readings kept per component
    pub leak_window_size: usize,
    /// Growth that counts as a leak, and the self-increase suspect threshold
    pub significant_increase_mb: Megabytes,
    /// Smallest recorded change, and the dip tolerated inside a rising trend
    pub min_memory_change_mb: Megabytes,
    /// Readings needed before a trend is judged
    pub min_trend_readings: usize,
    /// Available memory at or below which the system is low on memory
    pub low_memory_threshold_mb: Megabytes,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            session_tick_interval: SESSION_TICK_INTERVAL,
            evaluation_cadence: TREND_EVALUATION_CADENCE,
            leak_window_size: LEAK_WINDOW_SIZE,
            significant_increase_mb: SIGNIFICANT_INCREASE_MB,
            min_memory_change_mb: MIN_MEMORY_CHANGE_MB,
            min_trend_readings: MIN_TREND_READINGS,
            low_memory_threshold_mb: DEFAULT_LOW_MEMORY_THRESHOLD_MB,
        }
    }
}

impl MonitorConfig {
    pub fn with_session_tick_interval(mut self, interval: Duration) -> Self {
        self.session_tick_interval = interval;
        self
    }

    pub fn with_evaluation_cadence(mut self, cadence: Duration) -> Self {
        self.evaluation_cadence = cadence;
        self
    }

    pub fn with_leak_window_size(mut self, size: usize) -> Self {
        self.leak_window_size = size;
        self
    }

    pub fn with_significant_increase(mut self, mb: Megabytes) -> Self {
        self.significant_increase_mb = mb;
        self
    }

    pub fn with_min_memory_change(mut self, mb: Megabytes) -> Self {
        self.min_memory_change_mb = mb;
        self
    }

    pub fn with_low_memory_threshold(mut self, mb: Megabytes) -> Self {
        self.low_memory_threshold_mb = mb;
        self
    }

    /// Load overrides from the environment on top of the defaults
    ///
    /// Environment variables:
    /// - LEAK_MONITOR_INTERVAL_MS: session sampling cadence
    /// - LEAK_MONITOR_WINDOW: readings kept per component
    /// - LEAK_MONITOR_THRESHOLD_MB: leak / suspect threshold
    /// - LEAK_MONITOR_MIN_CHANGE_MB: debounce and dip tolerance
    /// - LEAK_MONITOR_LOW_MEMORY_MB: low-memory threshold
    pub fn from_env() -> MonitorResult<Self> {
        let mut config = Self::default();

        if let Some(ms) = env_number::<u64>("LEAK_MONITOR_INTERVAL_MS")? {
            config.session_tick_interval = Duration::from_millis(ms);
        }
        if let Some(size) = env_number::<usize>("LEAK_MONITOR_WINDOW")? {
            config.leak_window_size = size;
        }
        if let Some(mb) = env_number::<Megabytes>("LEAK_MONITOR_THRESHOLD_MB")? {
            config.significant_increase_mb = mb;
        }
        if let Some(mb) = env_number::<Megabytes>("LEAK_MONITOR_MIN_CHANGE_MB")? {
            config.min_memory_change_mb = mb;
        }
        if let Some(mb) = env_number::<Megabytes>("LEAK_MONITOR_LOW_MEMORY_MB")? {
            config.low_memory_threshold_mb = mb;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> MonitorResult<()> {
        if self.session_tick_interval.is_zero() {
            return Err(MonitorError::InvalidArgument(
                "session tick interval must be positive".into(),
            ));
        }
        if self.min_trend_readings < 2 {
            return Err(MonitorError::InvalidArgument(
                "a trend needs at least two readings".into(),
            ));
        }
        if self.leak_window_size < self.min_trend_readings {
            return Err(MonitorError::InvalidArgument(format!(
                "leak window ({}) is smaller than the readings a trend needs ({})",
                self.leak_window_size, self.min_trend_readings
            )));
        }
        if self.significant_increase_mb <= 0 {
            return Err(MonitorError::InvalidArgument(
                "significant increase must be positive".into(),
            ));
        }
        if self.min_memory_change_mb < 0 || self.low_memory_threshold_mb < 0 {
            return Err(MonitorError::InvalidArgument(
                "memory thresholds must not be negative".into(),
            ));
        }
        Ok(())
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> MonitorResult<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| {
                MonitorError::InvalidArgument(format!("{} is not a number: {:?}", key, raw))
            }),
        Err(_) => Ok(None),
    }
}
