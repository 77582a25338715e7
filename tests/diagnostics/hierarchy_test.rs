/*!
 * Hierarchy Tests
 * Id uniqueness under concurrency and report wire format
 */

use crate::support::*;
use leak_monitor::{ComponentHierarchyTracker, NodeId};
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::thread;

#[test]
fn test_ids_distinct_across_threads() {
    let provider = ManualProvider::new(100);
    let (monitor, _stream) = monitor_with(fast_config(), provider);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let monitor = monitor.clone();
            thread::spawn(move || {
                (0..50)
                    .map(|_| monitor.start_component_tracking("Row").unwrap())
                    .collect::<Vec<NodeId>>()
            })
        })
        .collect();

    let ids: HashSet<NodeId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    assert_eq!(ids.len(), 400);
    assert_eq!(monitor.active_component_count(), 400);
}

#[test]
fn test_out_of_order_unmount_keeps_parent_stack() {
    let mut tracker = ComponentHierarchyTracker::new();
    let a = tracker.track_component("A");
    let b = tracker.track_component("B");

    // A leaves before B; the next mount still nests under B
    assert!(tracker.untrack_component(&a));
    let c = tracker.track_component("C");
    assert_eq!(tracker.get_node(&c).unwrap().parent_id.as_ref(), Some(&b));
    assert_eq!(tracker.parent_stack(), &[b.clone(), c.clone()]);
}

#[test]
fn test_report_wire_format() {
    let provider = ManualProvider::new(100);
    let (monitor, _stream) = monitor_with(fast_config(), provider.clone());

    let root = monitor.start_component_tracking("Root").unwrap();
    let leaf = monitor.start_component_tracking("Leaf").unwrap();
    provider.set_used(140);
    monitor.stop_component_tracking(&leaf);
    monitor.stop_component_tracking(&root);

    let json = serde_json::to_value(monitor.hierarchy_report()).unwrap();
    assert_eq!(json["metrics"]["totalComponents"], 2);
    assert_eq!(json["metrics"]["maxDepth"], 1);

    let root_json = &json["tree"][0];
    assert_eq!(root_json["name"], "Root");
    assert!(root_json["unmountTime"].is_u64());
    assert_eq!(root_json["memoryData"]["baseline"], 100);
    assert_eq!(root_json["memoryData"]["final"], 140);
    assert_eq!(root_json["memoryData"]["totalChange"], 40);

    let leaf_json = &root_json["children"][0];
    assert_eq!(leaf_json["name"], "Leaf");
    assert!(leaf_json.get("children").is_none());

    let suspects = json["leakingSuspects"].as_array().unwrap();
    assert_eq!(suspects.len(), 1);
    assert_eq!(suspects[0]["componentName"], "Leaf");
    assert_eq!(suspects[0]["realIncrease"], 40);
    assert_eq!(suspects[0]["childrenIncrease"], 0);
}
