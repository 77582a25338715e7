/*!
 * Sampling Loop Tests
 * Cancellation, restarts and provider failures
 */

use crate::support::*;
use leak_monitor::memory::MemoryInfo;
use leak_monitor::{EventKind, MemoryProvider, MonitorError, MonitorResult};
use mockall::mock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Provider {}

    impl MemoryProvider for Provider {
        fn sample(&self) -> MonitorResult<MemoryInfo>;
    }
}

#[tokio::test]
async fn test_no_ticks_after_stop_session() {
    let provider = ManualProvider::new(100);
    let (monitor, stream) = monitor_with(fast_config(), provider);
    let mut sub = stream.subscribe();

    monitor.start_session(1.0).await.unwrap();
    assert!(wait_until(|| stream.stats().events_produced >= 3).await);

    monitor.stop_session().await;
    assert!(!monitor.is_monitoring());
    sub.drain();

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert!(sub.drain().is_empty());
}

#[tokio::test]
async fn test_restart_never_runs_two_loops() {
    let provider = ManualProvider::new(100);
    // Session ticks are an hour apart: only the immediate first tick can fire
    let config = fast_config().with_session_tick_interval(Duration::from_secs(3600));
    let (monitor, stream) = monitor_with(config, provider);
    let mut sub = stream.subscribe();

    monitor.start_memory_monitoring(5).await.unwrap();
    assert!(wait_until(|| stream.stats().events_produced >= 3).await);

    monitor.start_session(1.0).await.unwrap();
    sub.drain();

    tokio::time::sleep(Duration::from_millis(60)).await;
    let events = sub.drain();
    assert!(count(&events, EventKind::MemoryUpdate) <= 1);

    monitor.stop_session().await;
}

#[tokio::test]
async fn test_repeated_session_restarts() {
    let provider = ManualProvider::new(100);
    let (monitor, stream) = monitor_with(fast_config(), provider);
    let mut sub = stream.subscribe();

    for _ in 0..5 {
        monitor.start_session(1.0).await.unwrap();
    }
    monitor.stop_session().await;
    sub.drain();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(sub.drain().is_empty());
}

#[tokio::test]
async fn test_stop_memory_monitoring_keeps_session() {
    let provider = ManualProvider::new(100);
    let (monitor, _stream) = monitor_with(fast_config(), provider);

    monitor.start_session(1.0).await.unwrap();
    monitor.start_memory_monitoring(10).await.unwrap();
    assert!(monitor.is_monitoring());

    monitor.stop_memory_monitoring().await.unwrap();
    assert!(!monitor.is_monitoring());
    assert!(monitor.is_session_active());
    assert!(!monitor.sample_now());
}

#[tokio::test]
async fn test_failed_samples_do_not_stop_loop() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut provider = MockProvider::new();
    provider.expect_sample().returning(move || {
        if counter.fetch_add(1, Ordering::SeqCst) < 3 {
            Err(MonitorError::MetricsUnavailable("sensor busy".into()))
        } else {
            Ok(info(200))
        }
    });

    let (monitor, stream) = monitor_with(fast_config(), Arc::new(provider));
    monitor.start_memory_monitoring(5).await.unwrap();

    assert!(wait_until(|| stream.stats().events_produced >= 1).await);
    assert!(monitor.is_monitoring());

    let stats = monitor.sampler_stats();
    assert_eq!(stats.failures, 3);
    assert!(stats.samples >= 1);

    monitor.stop_memory_monitoring().await.unwrap();
}

#[tokio::test]
async fn test_tracking_fails_without_any_sample() {
    let mut provider = MockProvider::new();
    provider
        .expect_sample()
        .returning(|| Err(MonitorError::MetricsUnavailable("no metrics".into())));

    let (monitor, _stream) = monitor_with(fast_config(), Arc::new(provider));
    assert!(matches!(
        monitor.start_component_tracking("Screen"),
        Err(MonitorError::MetricsUnavailable(_))
    ));
    assert!(monitor.get_memory_info().is_err());
}

#[tokio::test]
async fn test_low_memory_flag_in_updates() {
    let provider = ManualProvider::new(TOTAL_MB - 100);
    let (monitor, _stream) = monitor_with(fast_config(), provider);

    let info = monitor.get_memory_info().unwrap();
    assert!(info.is_low_memory);
    assert_eq!(info.available_memory, 100);
    assert_eq!(info.used_memory, TOTAL_MB - 100);
}
