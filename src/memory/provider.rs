/*!
 * System Memory Provider
 * Memory snapshots from the host via sysinfo
 */

use super::traits::MemoryProvider;
use super::types::MemoryInfo;
use crate::core::errors::MonitorError;
use crate::core::types::{bytes_to_mb, Megabytes, MonitorResult};
use parking_lot::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::warn;

/// Reads system memory and the current process's resident set size
pub struct SystemMemoryProvider {
    system: Mutex<System>,
    pid: Option<Pid>,
    low_memory_threshold_mb: Megabytes,
}

impl SystemMemoryProvider {
    pub fn new(low_memory_threshold_mb: Megabytes) -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!(error = %e, "Failed to get current PID, app memory will read as 0");
                None
            }
        };

        Self {
            system: Mutex::new(System::new()),
            pid,
            low_memory_threshold_mb,
        }
    }
}

impl MemoryProvider for SystemMemoryProvider {
    fn sample(&self) -> MonitorResult<MemoryInfo> {
        let mut system = self.system.lock();
        system.refresh_memory();

        let total = system.total_memory();
        if total == 0 {
            return Err(MonitorError::MetricsUnavailable(
                "system reported zero total memory".into(),
            ));
        }
        let available = system.available_memory();

        let app = match self.pid {
            Some(pid) => {
                system.refresh_processes(ProcessesToUpdate::Some(&[pid]), false);
                system.process(pid).map(|p| p.memory()).unwrap_or(0)
            }
            None => 0,
        };

        Ok(MemoryInfo::new(
            bytes_to_mb(total),
            bytes_to_mb(available),
            bytes_to_mb(app),
            self.low_memory_threshold_mb,
        ))
    }
}
