/*!
 * Limits and Constants
 *
 * Thresholds and cadences used by the diagnostics engine, grouped by domain.
 */

use super::types::Megabytes;
use std::time::Duration;

// =============================================================================
// TREND DETECTION
// =============================================================================

/// Readings kept per tracked component (oldest evicted first)
pub const LEAK_WINDOW_SIZE: usize = 8;

/// Growth over the window that counts as a leak (MB)
/// Also the self-increase threshold for hierarchy leak suspects
pub const SIGNIFICANT_INCREASE_MB: Megabytes = 20;

/// Smallest change between readings that is recorded (MB)
/// Also the dip tolerated between consecutive readings of a rising trend
pub const MIN_MEMORY_CHANGE_MB: Megabytes = 5;

/// Readings required before a trend is evaluated
pub const MIN_TREND_READINGS: usize = 3;

// =============================================================================
// HIERARCHY REPORTS
// =============================================================================

/// Deepest level rendered with children in a report tree (root = 0)
/// Keeps the serialized report inside serde_json's default recursion limit
pub const MAX_TREE_DEPTH: usize = 50;

// =============================================================================
// SAMPLING
// =============================================================================

/// Sampling cadence of a monitoring session
pub const SESSION_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Minimum time between two trend evaluations
/// Extra samples (manual triggers, fast monitoring intervals) only refresh memory info
pub const TREND_EVALUATION_CADENCE: Duration = Duration::from_secs(1);

/// Available memory at or below which the system counts as low on memory (MB)
pub const DEFAULT_LOW_MEMORY_THRESHOLD_MB: Megabytes = 256;

/// Default session length used by the binary (minutes)
pub const DEFAULT_SESSION_MINUTES: f64 = 0.5;

// =============================================================================
// EVENTS & OBSERVABILITY
// =============================================================================

/// Capacity of the event ring buffer (power of 2)
pub const EVENT_RING_SIZE: usize = 4096;

/// Report generation slower than this is logged as a warning
pub const SLOW_OPERATION_THRESHOLD: Duration = Duration::from_millis(100);
