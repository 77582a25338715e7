/*!
 * Leak Monitor
 *
 * Public handle of the diagnostics engine. Owns the sampler, the event sink,
 * the diagnostics state and at most one sampling loop.
 *
 * Locking:
 * - State: one parking_lot mutex, never held across an await. Events are
 *   collected under it and published after release.
 * - Loop slot: a tokio mutex serializing start/stop. Starting joins the
 *   previous loop first; stopping joins before returning. The generation
 *   counter in the state keeps a superseded loop from applying a tick.
 */

use super::session::{Session, SessionReport};
use super::state::DiagnosticsState;
use crate::core::config::MonitorConfig;
use crate::core::errors::MonitorError;
use crate::core::id::NodeId;
use crate::core::types::{now_ms, MonitorResult};
use crate::memory::{MemoryInfo, MemoryProvider, MemorySampler, SamplerStats, SystemMemoryProvider};
use crate::monitoring::{
    span_operation, weak_handler, EventSink, MonitorEvent, SamplingTask, TickHandler,
};
use crate::tracking::{HierarchyReport, LeakAlert};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

struct MonitorCore {
    config: MonitorConfig,
    sampler: MemorySampler,
    sink: Arc<dyn EventSink>,
    state: Mutex<DiagnosticsState>,
    monitoring: AtomicBool,
}

impl TickHandler for MonitorCore {
    fn on_tick(&self, generation: u64) {
        let info = match self.sampler.sample() {
            Ok(info) => info,
            Err(e) => {
                warn!(generation, error = %e, "memory sample failed, skipping tick");
                return;
            }
        };
        let timestamp = now_ms();

        let leaks = {
            let mut state = self.state.lock();
            match state.apply_sample(generation, &info, Instant::now()) {
                Some(leaks) => leaks,
                None => return,
            }
        };

        for alert in leaks {
            self.sink.publish(MonitorEvent::LeakDetected(alert));
        }
        self.sink
            .publish(MonitorEvent::memory_update(info, timestamp));
    }
}

/// Cloneable handle to one diagnostics engine
#[derive(Clone)]
pub struct LeakMonitor {
    core: Arc<MonitorCore>,
    task: Arc<tokio::sync::Mutex<Option<SamplingTask>>>,
}

impl LeakMonitor {
    pub fn new(
        config: MonitorConfig,
        provider: Arc<dyn MemoryProvider>,
        sink: Arc<dyn EventSink>,
    ) -> MonitorResult<Self> {
        config.validate()?;
        let state = DiagnosticsState::new(&config);

        Ok(Self {
            core: Arc::new(MonitorCore {
                config,
                sampler: MemorySampler::new(provider),
                sink,
                state: Mutex::new(state),
                monitoring: AtomicBool::new(false),
            }),
            task: Arc::new(tokio::sync::Mutex::new(None)),
        })
    }

    /// Monitor backed by the host's memory statistics
    pub fn with_system_provider(
        config: MonitorConfig,
        sink: Arc<dyn EventSink>,
    ) -> MonitorResult<Self> {
        let provider = Arc::new(SystemMemoryProvider::new(config.low_memory_threshold_mb));
        Self::new(config, provider, sink)
    }

    #[inline]
    pub fn config(&self) -> &MonitorConfig {
        &self.core.config
    }

    /// Start a session, replacing any running loop and all per-session state
    pub async fn start_session(&self, duration_minutes: f64) -> MonitorResult<()> {
        let session = Session::start(duration_minutes, now_ms())?;
        ensure_runtime()?;

        let mut slot = self.task.lock().await;
        let _ = self.halt(&mut slot).await;

        let generation = {
            let mut state = self.core.state.lock();
            state.begin_session(session);
            state.next_generation()
        };
        *slot = Some(self.spawn_loop(self.core.config.session_tick_interval, generation)?);
        Ok(())
    }

    /// Stop the loop and the session, returning its report
    ///
    /// Without an active session the report is empty.
    pub async fn stop_session(&self) -> SessionReport {
        let span = span_operation("stop_session");

        let mut slot = self.task.lock().await;
        let _ = self.halt(&mut slot).await;

        let report = self.core.state.lock().end_session(now_ms());
        drop(slot);

        span.record_result(true);
        self.core
            .sink
            .publish(MonitorEvent::SessionComplete(report.clone()));
        report
    }

    /// Run the sampling loop at a caller-chosen interval, leaving the session untouched
    pub async fn start_memory_monitoring(&self, interval_ms: u64) -> MonitorResult<()> {
        if interval_ms == 0 {
            return Err(MonitorError::InvalidArgument(
                "monitoring interval must be positive".into(),
            ));
        }
        ensure_runtime()?;

        let mut slot = self.task.lock().await;
        let _ = self.halt(&mut slot).await;

        let generation = self.core.state.lock().next_generation();
        *slot = Some(self.spawn_loop(Duration::from_millis(interval_ms), generation)?);
        Ok(())
    }

    /// Stop the sampling loop and end the leak-reporting epoch
    pub async fn stop_memory_monitoring(&self) -> MonitorResult<()> {
        let mut slot = self.task.lock().await;
        let result = self.halt(&mut slot).await;
        self.core.state.lock().reset_leak_tracking();
        result
    }

    /// Sample memory now
    pub fn get_memory_info(&self) -> MonitorResult<MemoryInfo> {
        self.core.sampler.sample()
    }

    /// Mount a component instance baselined at the current used memory
    pub fn start_component_tracking(&self, name: &str) -> MonitorResult<NodeId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MonitorError::InvalidArgument(
                "component name must not be empty".into(),
            ));
        }
        let baseline = self.core.sampler.sample_or_last()?.used_memory;

        Ok(self.core.state.lock().mount(name, baseline))
    }

    /// Unmount a component instance; unknown ids are ignored
    pub fn stop_component_tracking(&self, id: &NodeId) -> bool {
        let current = match self.core.sampler.sample() {
            Ok(info) => Some(info.used_memory),
            Err(e) => {
                debug!(node_id = %id, error = %e, "no fresh sample at unmount");
                None
            }
        };
        self.core.state.lock().unmount(id, current)
    }

    /// Clear leak suppression so components can be reported again
    pub fn reset_leak_tracking(&self) {
        self.core.state.lock().reset_leak_tracking();
    }

    /// Ask the running loop for an immediate tick
    ///
    /// Returns false if no loop is running or one is being started or stopped.
    pub fn sample_now(&self) -> bool {
        match self.task.try_lock() {
            Ok(slot) => match slot.as_ref() {
                Some(task) => {
                    task.trigger();
                    true
                }
                None => false,
            },
            Err(_) => false,
        }
    }

    /// Leak alerts raised in the current session, latest per component name
    pub fn detected_leaks(&self) -> Vec<LeakAlert> {
        self.core.state.lock().detected_leaks()
    }

    pub fn hierarchy_report(&self) -> HierarchyReport {
        let _span = span_operation("hierarchy_report");
        self.core.state.lock().hierarchy_report()
    }

    pub fn is_session_active(&self) -> bool {
        self.core.state.lock().is_session_active()
    }

    pub fn is_monitoring(&self) -> bool {
        self.core.monitoring.load(Ordering::Acquire)
    }

    pub fn active_component_count(&self) -> usize {
        self.core.state.lock().active_count()
    }

    pub fn sampler_stats(&self) -> SamplerStats {
        self.core.sampler.stats()
    }

    fn spawn_loop(&self, interval: Duration, generation: u64) -> MonitorResult<SamplingTask> {
        let task = SamplingTask::spawn(interval, weak_handler(&self.core), generation)?;
        self.core.monitoring.store(true, Ordering::Release);
        info!(
            interval_ms = interval.as_millis() as u64,
            generation, "memory monitoring started"
        );
        Ok(task)
    }

    /// Invalidate and join the running loop, if any
    async fn halt(&self, slot: &mut Option<SamplingTask>) -> MonitorResult<()> {
        self.core.state.lock().next_generation();

        let Some(task) = slot.take() else {
            return Ok(());
        };
        self.core.monitoring.store(false, Ordering::Release);

        let generation = task.generation();
        match task.shutdown().await {
            Ok(()) => {
                info!(generation, "memory monitoring stopped");
                Ok(())
            }
            Err(e) => {
                warn!(generation, error = %e, "sampling loop ended abnormally");
                Err(e)
            }
        }
    }
}

fn ensure_runtime() -> MonitorResult<()> {
    tokio::runtime::Handle::try_current()
        .map(|_| ())
        .map_err(|_| MonitorError::NoRuntime)
}
