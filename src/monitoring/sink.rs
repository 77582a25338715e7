/*!
 * Event Sinks
 * Where outbound events go
 */

use super::events::{MonitorEvent, Severity};
use tracing::{debug, info, warn};

/// Receiver of outbound events
///
/// Called after the engine released its state lock, from the sampling task
/// or from the caller of a lifecycle operation. Must not block.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: MonitorEvent);
}

/// Logs every event as structured tracing output
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: MonitorEvent) {
        let severity = event.severity();
        match &event {
            MonitorEvent::MemoryUpdate { memory_info, .. } => {
                if severity >= Severity::Warn {
                    warn!(
                        used_mb = memory_info.used_memory,
                        available_mb = memory_info.available_memory,
                        app_mb = memory_info.app_memory,
                        pressure = %memory_info.memory_pressure(),
                        "memory update"
                    );
                } else {
                    debug!(
                        used_mb = memory_info.used_memory,
                        available_mb = memory_info.available_memory,
                        app_mb = memory_info.app_memory,
                        "memory update"
                    );
                }
            }
            MonitorEvent::LeakDetected(alert) => {
                warn!(
                    component = %alert.component_name,
                    total_increase_mb = alert.total_increase,
                    initial_mb = alert.initial_memory,
                    current_mb = alert.current_memory,
                    readings = ?alert.memory_readings,
                    "leak detected"
                );
            }
            MonitorEvent::SessionComplete(report) => {
                info!(
                    components = report.components_analyzed,
                    suspects = report.hierarchy.leaking_suspects.len(),
                    leaks = report.leaks_detected.len(),
                    duration_ms = report.duration_ms,
                    "session complete"
                );
            }
        }
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: MonitorEvent) {}
}
