/*!
 * Sampling Task
 *
 * Background tokio task that drives periodic memory sampling. One task per
 * running loop; the owner controls it through a command channel and joins
 * it on shutdown so no tick can run after shutdown returns.
 */

use crate::core::errors::MonitorError;
use crate::core::types::MonitorResult;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Receiver of loop ticks
pub trait TickHandler: Send + Sync {
    /// Called once per tick with the generation the loop was spawned for
    fn on_tick(&self, generation: u64);
}

/// Control messages for the sampling task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingCommand {
    /// Run one tick immediately
    Trigger,
    /// Stop the loop
    Shutdown,
}

/// Handle to the sampling background task
pub struct SamplingTask {
    command_tx: mpsc::UnboundedSender<SamplingCommand>,
    handle: Option<tokio::task::JoinHandle<()>>,
    interval: Duration,
    generation: u64,
}

impl SamplingTask {
    /// Spawn a loop on the current tokio runtime
    ///
    /// The handler is held weakly; the loop ends on its own once the handler
    /// is dropped.
    pub fn spawn(
        interval: Duration,
        handler: Weak<dyn TickHandler>,
        generation: u64,
    ) -> MonitorResult<Self> {
        if interval.is_zero() {
            return Err(MonitorError::InvalidArgument(
                "sampling interval must be positive".into(),
            ));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let handle = runtime.spawn(run_sampling_loop(interval, handler, generation, command_rx));

        info!(
            interval_ms = interval.as_millis() as u64,
            generation, "sampling task spawned"
        );

        Ok(Self {
            command_tx,
            handle: Some(handle),
            interval,
            generation,
        })
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the loop is still running
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Request an immediate tick
    pub fn trigger(&self) {
        let _ = self.command_tx.send(SamplingCommand::Trigger);
    }

    /// Stop the loop and wait for it to finish
    pub async fn shutdown(mut self) -> MonitorResult<()> {
        let _ = self.command_tx.send(SamplingCommand::Shutdown);

        match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(()) => {
                    debug!(generation = self.generation, "sampling task shutdown complete");
                    Ok(())
                }
                Err(e) => {
                    warn!(generation = self.generation, error = %e, "sampling task shutdown error");
                    Err(MonitorError::TaskFailed(e.to_string()))
                }
            },
            None => Ok(()),
        }
    }
}

async fn run_sampling_loop(
    period: Duration,
    handler: Weak<dyn TickHandler>,
    generation: u64,
    mut command_rx: mpsc::UnboundedReceiver<SamplingCommand>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            cmd = command_rx.recv() => {
                match cmd {
                    Some(SamplingCommand::Trigger) => {
                        trace!(generation, "manual sampling trigger");
                        if !dispatch(&handler, generation) {
                            break;
                        }
                    }
                    Some(SamplingCommand::Shutdown) | None => {
                        debug!(generation, "sampling task shutting down");
                        break;
                    }
                }
            }

            _ = interval.tick() => {
                if !dispatch(&handler, generation) {
                    break;
                }
            }
        }
    }
}

fn dispatch(handler: &Weak<dyn TickHandler>, generation: u64) -> bool {
    match handler.upgrade() {
        Some(handler) => {
            handler.on_tick(generation);
            true
        }
        None => {
            debug!(generation, "tick handler dropped, sampling task exiting");
            false
        }
    }
}

impl Drop for SamplingTask {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.command_tx.send(SamplingCommand::Shutdown);
        }
    }
}

/// Downgrade a concrete handler for [`SamplingTask::spawn`]
pub fn weak_handler<H: TickHandler + 'static>(handler: &Arc<H>) -> Weak<dyn TickHandler> {
    let weak: Weak<H> = Arc::downgrade(handler);
    weak
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct Counter {
        ticks: AtomicU64,
        last_generation: AtomicU64,
    }

    impl TickHandler for Counter {
        fn on_tick(&self, generation: u64) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            self.last_generation.store(generation, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_sampling_task_lifecycle() {
        let counter = Arc::new(Counter::default());
        let task = SamplingTask::spawn(Duration::from_millis(5), weak_handler(&counter), 3)
            .unwrap();
        assert!(task.is_running());
        assert_eq!(task.generation(), 3);

        tokio::time::sleep(Duration::from_millis(30)).await;
        task.shutdown().await.unwrap();

        let ticks = counter.ticks.load(Ordering::SeqCst);
        assert!(ticks >= 1);
        assert_eq!(counter.last_generation.load(Ordering::SeqCst), 3);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), ticks);
    }

    #[tokio::test]
    async fn test_trigger_runs_extra_tick() {
        let counter = Arc::new(Counter::default());
        let task = SamplingTask::spawn(Duration::from_secs(3600), weak_handler(&counter), 1)
            .unwrap();

        // The first interval tick completes immediately
        tokio::time::sleep(Duration::from_millis(10)).await;
        let before = counter.ticks.load(Ordering::SeqCst);

        task.trigger();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(counter.ticks.load(Ordering::SeqCst), before + 1);

        task.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_loop_exits_when_handler_dropped() {
        let counter = Arc::new(Counter::default());
        let task = SamplingTask::spawn(Duration::from_millis(5), weak_handler(&counter), 1)
            .unwrap();
        drop(counter);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!task.is_running());
        task.shutdown().await.unwrap();
    }

    #[test]
    fn test_spawn_outside_runtime() {
        let counter = Arc::new(Counter::default());
        let result = SamplingTask::spawn(Duration::from_millis(5), weak_handler(&counter), 1);
        assert!(matches!(result, Err(MonitorError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let counter = Arc::new(Counter::default());
        let result = SamplingTask::spawn(Duration::ZERO, weak_handler(&counter), 1);
        assert!(matches!(result, Err(MonitorError::InvalidArgument(_))));
    }
}
