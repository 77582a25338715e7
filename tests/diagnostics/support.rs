/*!
 * Shared test fixtures
 */

use leak_monitor::memory::MemoryInfo;
use leak_monitor::{
    EventKind, EventStream, LeakMonitor, MemoryProvider, MonitorConfig, MonitorError,
    MonitorEvent, MonitorResult,
};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const TOTAL_MB: i64 = 16_000;

/// Provider whose used memory is set by the test
pub struct ManualProvider {
    used: AtomicI64,
    failing: AtomicBool,
}

impl ManualProvider {
    pub fn new(used: i64) -> Arc<Self> {
        Arc::new(Self {
            used: AtomicI64::new(used),
            failing: AtomicBool::new(false),
        })
    }

    pub fn set_used(&self, used: i64) {
        self.used.store(used, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl MemoryProvider for ManualProvider {
    fn sample(&self) -> MonitorResult<MemoryInfo> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MonitorError::MetricsUnavailable("provider offline".into()));
        }
        let used = self.used.load(Ordering::SeqCst);
        Ok(MemoryInfo::new(TOTAL_MB, TOTAL_MB - used, used, 256))
    }
}

pub fn info(used: i64) -> MemoryInfo {
    MemoryInfo::new(TOTAL_MB, TOTAL_MB - used, used, 256)
}

/// 5 ms ticks, every tick evaluated
pub fn fast_config() -> MonitorConfig {
    MonitorConfig::default()
        .with_session_tick_interval(Duration::from_millis(5))
        .with_evaluation_cadence(Duration::ZERO)
}

pub fn monitor_with(
    config: MonitorConfig,
    provider: Arc<dyn MemoryProvider>,
) -> (LeakMonitor, EventStream) {
    let stream = EventStream::new();
    let monitor = monitor_on(config, provider, &stream);
    (monitor, stream)
}

/// Monitor publishing into a caller-built stream
pub fn monitor_on(
    config: MonitorConfig,
    provider: Arc<dyn MemoryProvider>,
    stream: &EventStream,
) -> LeakMonitor {
    LeakMonitor::new(config, provider, Arc::new(stream.clone())).expect("valid config")
}

/// Poll until `condition` holds or a second passes
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

pub fn count(events: &[MonitorEvent], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind() == kind).count()
}
