/*!
 * Session Tests
 * Lifecycle, leak alerts and the session report
 */

use crate::support::*;
use leak_monitor::monitoring::EventFilter;
use leak_monitor::{EventKind, EventStream, MonitorEvent};
use pretty_assertions::assert_eq;
use std::time::Duration;

fn first_root_readings(monitor: &leak_monitor::LeakMonitor) -> Vec<i64> {
    monitor
        .hierarchy_report()
        .tree
        .first()
        .and_then(|node| node.memory_data.as_ref())
        .map(|summary| summary.readings.clone())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_stop_without_session_returns_empty_report() {
    let provider = ManualProvider::new(100);
    let (monitor, stream) = monitor_with(fast_config(), provider);

    let report = monitor.stop_session().await;
    assert_eq!(report.components_analyzed, 0);
    assert!(report.components.is_empty());
    assert!(report.hierarchy.tree.is_empty());
    assert!(report.hierarchy.leaking_suspects.is_empty());
    assert_eq!(report.hierarchy.metrics.total_components, 0);

    let events = stream.subscribe().drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), EventKind::SessionComplete);
}

#[tokio::test]
async fn test_session_complete_delivered_when_ring_is_full() {
    let provider = ManualProvider::new(100);
    let stream = EventStream::with_capacity(16);
    let monitor = monitor_on(fast_config(), provider, &stream);
    let mut sub = stream.subscribe();
    let mut leaks = stream.subscribe_filtered(EventFilter::new().kind(EventKind::LeakDetected));

    monitor.start_session(1.0).await.unwrap();
    assert!(wait_until(|| stream.stats().events_produced >= 24).await);
    let report = monitor.stop_session().await;

    let events = sub.drain();
    assert_eq!(events.len(), 16);
    assert_eq!(count(&events, EventKind::SessionComplete), 1);
    assert_eq!(events.last(), Some(&MonitorEvent::SessionComplete(report)));
    assert!(stream.stats().events_dropped > 0);
    assert!(leaks.drain().is_empty());
}

#[tokio::test]
async fn test_leak_fires_once_until_reset() {
    let provider = ManualProvider::new(100);
    let (monitor, stream) = monitor_with(fast_config(), provider.clone());
    let mut sub = stream.subscribe();
    let mut events = Vec::new();

    monitor.start_session(1.0).await.unwrap();
    monitor.start_component_tracking("Leaky").unwrap();

    provider.set_used(102);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(first_root_readings(&monitor), vec![100]);

    provider.set_used(107);
    assert!(wait_until(|| first_root_readings(&monitor) == vec![100, 107]).await);

    provider.set_used(125);
    assert!(wait_until(|| monitor.detected_leaks().len() == 1).await);

    let alert = monitor.detected_leaks().remove(0);
    assert_eq!(alert.component_name, "Leaky");
    assert_eq!(alert.total_increase, 25);
    assert_eq!(alert.initial_memory, 100);
    assert_eq!(alert.memory_readings, vec![100, 107, 125]);
    assert!(alert.is_first_report);

    provider.set_used(126);
    tokio::time::sleep(Duration::from_millis(30)).await;
    events.extend(sub.drain());
    assert_eq!(count(&events, EventKind::LeakDetected), 1);

    monitor.reset_leak_tracking();
    provider.set_used(140);
    assert!(
        wait_until(|| {
            events.extend(sub.drain());
            count(&events, EventKind::LeakDetected) == 2
        })
        .await
    );
    assert_eq!(monitor.detected_leaks()[0].current_memory, 140);

    let report = monitor.stop_session().await;
    assert_eq!(report.leaks_detected.len(), 1);
    assert_eq!(report.leaks_detected[0].current_memory, 140);
}

#[tokio::test]
async fn test_leak_event_wire_shape() {
    let provider = ManualProvider::new(100);
    let (monitor, stream) = monitor_with(fast_config(), provider.clone());
    let mut sub = stream.subscribe();

    monitor.start_session(1.0).await.unwrap();
    monitor.start_component_tracking("Gallery").unwrap();
    provider.set_used(110);
    assert!(wait_until(|| first_root_readings(&monitor).len() == 2).await);
    provider.set_used(130);
    assert!(wait_until(|| !monitor.detected_leaks().is_empty()).await);
    monitor.stop_session().await;

    let leak = sub
        .drain()
        .into_iter()
        .find(|e| matches!(e, MonitorEvent::LeakDetected(_)))
        .expect("leak event");
    let json = serde_json::to_value(&leak).unwrap();
    assert_eq!(json["type"], "leakDetected");
    assert_eq!(json["componentName"], "Gallery");
    assert_eq!(json["totalIncrease"], 30);
    assert_eq!(json["initialMemory"], 100);
    assert_eq!(json["currentMemory"], 130);
    assert_eq!(json["memoryReadings"], serde_json::json!([100, 110, 130]));
}

#[tokio::test]
async fn test_report_attributes_growth_to_child() {
    let provider = ManualProvider::new(100);
    let (monitor, _stream) = monitor_with(fast_config(), provider.clone());

    monitor.start_session(0.5).await.unwrap();
    let parent = monitor.start_component_tracking("Parent").unwrap();
    let child = monitor.start_component_tracking("Child").unwrap();

    provider.set_used(125);
    assert!(monitor.stop_component_tracking(&child));
    provider.set_used(130);
    assert!(monitor.stop_component_tracking(&parent));

    let report = monitor.stop_session().await;

    assert_eq!(report.components_analyzed, 2);
    assert_eq!(report.components[0].component_name, "Parent");
    assert_eq!(report.components[0].total_memory_change, 30);
    assert_eq!(report.components[1].component_name, "Child");
    assert_eq!(report.components[1].total_memory_change, 25);

    let tree = &report.hierarchy.tree;
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "Parent");
    let children = tree[0].children.as_ref().expect("children");
    assert_eq!(children[0].name, "Child");
    assert_eq!(report.hierarchy.metrics.total_components, 2);
    assert_eq!(report.hierarchy.metrics.max_depth, 1);

    assert_eq!(report.suspect_names(), vec!["Child"]);
    let suspect = &report.hierarchy.leaking_suspects[0];
    assert_eq!(suspect.real_increase, 25);
    assert_eq!(suspect.component_path, vec!["Parent".to_string(), "Child".to_string()]);
}

#[tokio::test]
async fn test_revisits_aggregate_per_name() {
    let provider = ManualProvider::new(100);
    let (monitor, _stream) = monitor_with(fast_config(), provider.clone());
    monitor.start_session(0.5).await.unwrap();

    for (start, end) in [(100, 104), (104, 110), (110, 112)] {
        provider.set_used(start);
        let id = monitor.start_component_tracking("Modal").unwrap();
        provider.set_used(end);
        monitor.stop_component_tracking(&id);
    }

    let report = monitor.stop_session().await;
    let modal = &report.components[0];
    assert_eq!(modal.visit_count, 3);
    assert_eq!(modal.total_mounts, 3);
    assert_eq!(modal.total_memory_change, 12);
    assert_eq!(modal.average_memory_per_visit, 4.0);
    assert_eq!(modal.max_single_visit_increase, 6);

    // Only the first mount is rendered as a root
    assert_eq!(report.hierarchy.tree.len(), 1);
}

#[tokio::test]
async fn test_restart_resets_session_state() {
    let provider = ManualProvider::new(100);
    let (monitor, _stream) = monitor_with(fast_config(), provider);

    monitor.start_session(1.0).await.unwrap();
    monitor.start_component_tracking("A").unwrap();
    assert_eq!(monitor.active_component_count(), 1);

    monitor.start_session(1.0).await.unwrap();
    assert_eq!(monitor.active_component_count(), 0);
    assert!(monitor.hierarchy_report().tree.is_empty());
    assert!(monitor.is_session_active());

    let report = monitor.stop_session().await;
    assert_eq!(report.components_analyzed, 0);
}

#[tokio::test]
async fn test_unknown_id_is_noop() {
    let provider = ManualProvider::new(100);
    let (monitor, _stream) = monitor_with(fast_config(), provider);
    let id = monitor.start_component_tracking("A").unwrap();

    assert!(monitor.stop_component_tracking(&id));
    assert!(!monitor.stop_component_tracking(&id));
    assert!(!monitor.stop_component_tracking(&"Ghost_1_deadbeef".into()));
}

#[tokio::test]
async fn test_tracking_uses_last_known_sample() {
    let provider = ManualProvider::new(100);
    let (monitor, _stream) = monitor_with(fast_config(), provider.clone());

    provider.set_failing(true);
    assert!(monitor.start_component_tracking("A").is_err());

    provider.set_failing(false);
    monitor.get_memory_info().unwrap();
    provider.set_failing(true);
    let id = monitor.start_component_tracking("B").unwrap();

    // No fresh sample at unmount: the node's last accepted reading closes the visit
    assert!(monitor.stop_component_tracking(&id));
    let tree = monitor.hierarchy_report().tree;
    assert_eq!(tree.len(), 1);
    let node = &tree[0];
    assert_eq!(node.name, "B");
    assert_eq!(node.memory_data.as_ref().unwrap().final_memory, 100);
}
