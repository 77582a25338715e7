/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Monitor errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum MonitorError {
    #[error("Memory metrics unavailable: {0}")]
    #[diagnostic(
        code(monitor::metrics_unavailable),
        help("The memory provider could not be queried. The sampling loop retries next tick.")
    )]
    MetricsUnavailable(String),

    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(monitor::invalid_argument),
        help("Intervals and durations must be positive; component names must not be empty.")
    )]
    InvalidArgument(String),

    #[error("No async runtime available")]
    #[diagnostic(
        code(monitor::no_runtime),
        help("Sampling loops are tokio tasks. Call this from within a tokio runtime.")
    )]
    NoRuntime,

    #[error("Sampling task failed: {0}")]
    #[diagnostic(
        code(monitor::task_failed),
        help("The background sampling task terminated abnormally. Check logs for a panic.")
    )]
    TaskFailed(String),
}

impl MonitorError {
    /// Whether the sampling loop can carry on after this error
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MonitorError::MetricsUnavailable(_))
    }
}
