/*!
 * Memory Sampler
 * Wraps a provider, normalizes its output and remembers the last good reading
 */

use super::traits::MemoryProvider;
use super::types::MemoryInfo;
use crate::core::types::MonitorResult;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sampling counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerStats {
    pub samples: u64,
    pub failures: u64,
}

pub struct MemorySampler {
    provider: Arc<dyn MemoryProvider>,
    last: Mutex<Option<MemoryInfo>>,
    samples: AtomicU64,
    failures: AtomicU64,
}

impl MemorySampler {
    pub fn new(provider: Arc<dyn MemoryProvider>) -> Self {
        Self {
            provider,
            last: Mutex::new(None),
            samples: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Take a fresh, normalized snapshot
    pub fn sample(&self) -> MonitorResult<MemoryInfo> {
        match self.provider.sample() {
            Ok(info) => {
                let info = info.normalized();
                *self.last.lock() = Some(info);
                self.samples.fetch_add(1, Ordering::Relaxed);
                Ok(info)
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    /// Fresh snapshot, or the last good one if the provider fails right now
    pub fn sample_or_last(&self) -> MonitorResult<MemoryInfo> {
        self.sample().or_else(|e| self.last_known().ok_or(e))
    }

    #[inline]
    pub fn last_known(&self) -> Option<MemoryInfo> {
        *self.last.lock()
    }

    pub fn stats(&self) -> SamplerStats {
        SamplerStats {
            samples: self.samples.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
