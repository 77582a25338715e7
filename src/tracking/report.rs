/*!
 * Report Types
 * Typed shapes of hierarchy reports and leak alerts as they go on the wire
 */

use crate::core::id::NodeId;
use crate::core::types::{Megabytes, Timestamp};
use serde::{Deserialize, Serialize};

/// Memory summary of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySummary {
    pub baseline: Megabytes,
    pub peak: Megabytes,
    #[serde(rename = "final")]
    pub final_memory: Megabytes,
    pub total_change: Megabytes,
    pub readings: Vec<Megabytes>,
}

/// One node of the rendered component tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: NodeId,
    pub name: String,
    pub mount_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unmount_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_data: Option<MemorySummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyMetrics {
    pub total_components: usize,
    pub max_depth: usize,
}

/// A node whose own growth exceeds what its heaviest child explains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakSuspect {
    pub component_id: NodeId,
    pub component_name: String,
    pub memory_increase: Megabytes,
    pub children_increase: Megabytes,
    pub real_increase: Megabytes,
    pub component_path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyReport {
    pub tree: Vec<TreeNode>,
    pub metrics: HierarchyMetrics,
    pub leaking_suspects: Vec<LeakSuspect>,
    pub timestamp: Timestamp,
}

/// Sustained growth detected while a component was mounted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeakAlert {
    pub component_name: String,
    pub total_increase: Megabytes,
    pub current_memory: Megabytes,
    pub initial_memory: Megabytes,
    pub memory_readings: Vec<Megabytes>,
    pub timestamp: Timestamp,
    pub is_first_report: bool,
}
