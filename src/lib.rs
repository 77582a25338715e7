/*!
 * Leak Monitor Library
 * Component-level memory leak diagnostics
 *
 * Tracks a forest of component mount instances, samples memory on a
 * background task, flags sustained per-component growth and produces a
 * session report attributing growth to the components that own it.
 */

pub mod core;
pub mod diagnostics;
pub mod memory;
pub mod monitoring;
pub mod tracking;

// Re-exports
pub use crate::core::{MonitorConfig, MonitorError, MonitorResult, NodeId};
pub use diagnostics::{LeakMonitor, SessionReport};
pub use memory::{MemoryInfo, MemoryPressure, MemoryProvider, SystemMemoryProvider};
pub use monitoring::{
    init_tracing, EventKind, EventSink, EventStream, MonitorEvent, Subscriber, TracingSink,
};
pub use tracking::{
    ComponentHierarchyTracker, ComponentSummary, HierarchyReport, LeakAlert, LeakSuspect,
    TrendDetector,
};
