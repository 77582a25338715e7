/*!
 * Memory Traits
 * Memory metrics provider abstraction
 */

use super::types::MemoryInfo;
use crate::core::types::MonitorResult;
use std::sync::Arc;

/// Source of memory snapshots
///
/// Called synchronously from the sampling task and from lifecycle calls.
/// Implementations must not block for long.
pub trait MemoryProvider: Send + Sync {
    /// Take a memory snapshot now
    fn sample(&self) -> MonitorResult<MemoryInfo>;
}

impl<P: MemoryProvider + ?Sized> MemoryProvider for Arc<P> {
    fn sample(&self) -> MonitorResult<MemoryInfo> {
        (**self).sample()
    }
}
