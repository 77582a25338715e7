/*!
 * Core Types
 * Common types used across the monitor
 */

use std::time::{SystemTime, UNIX_EPOCH};

use super::errors::MonitorError;

/// Whole megabytes. Signed so that deltas between readings stay representable.
pub type Megabytes = i64;

/// Wall-clock timestamp in milliseconds since the Unix epoch
pub type Timestamp = u64;

/// Common result type for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Current wall-clock time in milliseconds
#[inline]
pub fn now_ms() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as Timestamp
}

/// Convert a byte count to whole megabytes, rounding to nearest
#[inline]
pub fn bytes_to_mb(bytes: u64) -> Megabytes {
    (bytes as f64 / 1024.0 / 1024.0).round() as Megabytes
}
