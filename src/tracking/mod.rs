/*!
 * Component Tracking
 * Hierarchy of mount instances, per-name visit history and leak trend detection
 */

pub mod hierarchy;
pub mod history;
pub mod report;
pub mod snapshot;
pub mod trend;

pub use hierarchy::{ComponentHierarchyTracker, ComponentNode};
pub use history::{ComponentHistory, ComponentSummary, ComponentVisit};
pub use report::{
    HierarchyMetrics, HierarchyReport, LeakAlert, LeakSuspect, MemorySummary, TreeNode,
};
pub use snapshot::MemorySnapshot;
pub use trend::{is_increasing_trend, Observation, TrendDetector, TrendThresholds};
