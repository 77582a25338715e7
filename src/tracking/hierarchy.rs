/*!
 * Component Hierarchy Tracker
 *
 * Forest of mount instances linked through a mount-time parent stack.
 *
 * The parent of a new node is whatever node is on top of the stack when it
 * mounts, which assumes mount/unmount calls nest per call site. Unmounts
 * remove their own id from anywhere in the stack, so out-of-order unmounts
 * leave the remaining entries intact.
 */

use super::report::{HierarchyMetrics, HierarchyReport, LeakSuspect, MemorySummary, TreeNode};
use super::snapshot::MemorySnapshot;
use crate::core::id::{NodeId, NodeIdGenerator};
use crate::core::limits::{MAX_TREE_DEPTH, SIGNIFICANT_INCREASE_MB};
use crate::core::types::{now_ms, Megabytes, Timestamp};
use ahash::{AHashMap, AHashSet};
use tracing::debug;

/// One mount instance of a component
#[derive(Debug, Clone)]
pub struct ComponentNode {
    pub id: NodeId,
    pub name: String,
    pub parent_id: Option<NodeId>,
    pub mount_time: Timestamp,
    pub unmount_time: Option<Timestamp>,
    pub children: Vec<NodeId>,
    pub memory_snapshot: Option<MemorySnapshot>,
    /// Fixed at creation: the name had been mounted before
    pub is_revisit: bool,
}

impl ComponentNode {
    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.unmount_time.is_none()
    }

    /// Own growth since mount, 0 without a snapshot
    #[inline]
    pub fn memory_increase(&self) -> Megabytes {
        self.memory_snapshot
            .as_ref()
            .map_or(0, MemorySnapshot::total_change)
    }

    fn memory_summary(&self) -> Option<MemorySummary> {
        self.memory_snapshot.as_ref().map(|snapshot| MemorySummary {
            baseline: snapshot.baseline_memory,
            peak: snapshot.peak_memory,
            final_memory: snapshot.previous_memory,
            total_change: snapshot.total_change(),
            readings: snapshot.readings_vec(),
        })
    }
}

#[derive(Debug, Default)]
struct ComponentHierarchy {
    nodes: AHashMap<NodeId, ComponentNode>,
    root_ids: Vec<NodeId>,
}

pub struct ComponentHierarchyTracker {
    hierarchy: ComponentHierarchy,
    parent_stack: Vec<NodeId>,
    seen_names: AHashSet<String>,
    ids: NodeIdGenerator,
    suspect_threshold: Megabytes,
}

impl ComponentHierarchyTracker {
    pub fn new() -> Self {
        Self::with_threshold(SIGNIFICANT_INCREASE_MB)
    }

    /// Tracker flagging suspects whose self increase exceeds `suspect_threshold` MB
    pub fn with_threshold(suspect_threshold: Megabytes) -> Self {
        Self {
            hierarchy: ComponentHierarchy::default(),
            parent_stack: Vec::new(),
            seen_names: AHashSet::new(),
            ids: NodeIdGenerator::new(),
            suspect_threshold,
        }
    }

    /// Record a mount of `name` under the current top of the parent stack
    pub fn track_component(&mut self, name: &str) -> NodeId {
        let id = self.ids.next(name);
        let parent_id = self.parent_stack.last().cloned();
        let is_revisit = !self.seen_names.insert(name.to_string());

        let node = ComponentNode {
            id: id.clone(),
            name: name.to_string(),
            parent_id: parent_id.clone(),
            mount_time: now_ms(),
            unmount_time: None,
            children: Vec::new(),
            memory_snapshot: None,
            is_revisit,
        };

        match parent_id.as_ref().and_then(|p| self.hierarchy.nodes.get_mut(p)) {
            Some(parent) => parent.children.push(id.clone()),
            None => self.hierarchy.root_ids.push(id.clone()),
        }
        self.hierarchy.nodes.insert(id.clone(), node);
        self.parent_stack.push(id.clone());

        debug!(
            component = name,
            node_id = %id,
            parent = ?parent_id.as_ref().map(NodeId::as_str),
            revisit = is_revisit,
            "component mounted"
        );
        id
    }

    /// Record an unmount; returns false for unknown or already unmounted ids
    pub fn untrack_component(&mut self, id: &NodeId) -> bool {
        let Some(node) = self.hierarchy.nodes.get_mut(id) else {
            return false;
        };
        if !node.is_mounted() {
            return false;
        }
        node.unmount_time = Some(now_ms());

        if let Some(pos) = self.parent_stack.iter().rposition(|p| p == id) {
            self.parent_stack.remove(pos);
        }

        debug!(component = %node.name, node_id = %id, "component unmounted");
        true
    }

    #[inline]
    pub fn get_node(&self, id: &NodeId) -> Option<&ComponentNode> {
        self.hierarchy.nodes.get(id)
    }

    #[inline]
    pub fn get_node_mut(&mut self, id: &NodeId) -> Option<&mut ComponentNode> {
        self.hierarchy.nodes.get_mut(id)
    }

    /// Ids of parentless nodes, in mount order
    #[inline]
    pub fn root_ids(&self) -> &[NodeId] {
        &self.hierarchy.root_ids
    }

    /// Currently mounted nodes that new mounts would nest under, innermost last
    #[inline]
    pub fn parent_stack(&self) -> &[NodeId] {
        &self.parent_stack
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hierarchy.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hierarchy.nodes.is_empty()
    }

    /// Drop all nodes and names; the id sequence keeps counting
    pub fn reset(&mut self) {
        self.hierarchy = ComponentHierarchy::default();
        self.parent_stack.clear();
        self.seen_names.clear();
    }

    /// Render the tree, metrics and leak suspects
    ///
    /// Every traversal keeps its own stack, so arbitrarily deep mount chains
    /// are safe. The rendered tree stops nesting at `MAX_TREE_DEPTH`; metrics
    /// and suspects still cover the full depth.
    pub fn generate_hierarchy_report(&self) -> HierarchyReport {
        let roots = self.sorted_roots();
        let first_mounts: Vec<&ComponentNode> =
            roots.iter().copied().filter(|n| !n.is_revisit).collect();

        HierarchyReport {
            tree: self.render_tree(&first_mounts),
            metrics: self.measure(&first_mounts),
            leaking_suspects: self.find_leaking_suspects(&roots),
            timestamp: now_ms(),
        }
    }

    fn sorted_roots(&self) -> Vec<&ComponentNode> {
        let mut roots: Vec<&ComponentNode> = self
            .hierarchy
            .root_ids
            .iter()
            .filter_map(|id| self.hierarchy.nodes.get(id))
            .collect();
        roots.sort_by_key(|n| n.mount_time);
        roots
    }

    fn children_of<'a>(
        &'a self,
        node: &'a ComponentNode,
    ) -> impl DoubleEndedIterator<Item = &'a ComponentNode> + 'a {
        node.children
            .iter()
            .filter_map(move |id| self.hierarchy.nodes.get(id))
    }

    /// Post-order build: a node is emitted once all its children are
    fn render_tree(&self, roots: &[&ComponentNode]) -> Vec<TreeNode> {
        let mut tree = Vec::with_capacity(roots.len());
        let mut stack: Vec<RenderFrame<'_>> = Vec::new();

        for &root in roots {
            stack.push(RenderFrame::open(root, 0));

            while let Some(frame) = stack.last_mut() {
                let next = match frame.children {
                    Some(_) => frame
                        .pending
                        .by_ref()
                        .find_map(|id| self.hierarchy.nodes.get(id)),
                    None => None,
                };
                if let Some(child) = next {
                    let depth = frame.depth + 1;
                    stack.push(RenderFrame::open(child, depth));
                    continue;
                }

                let Some(done) = stack.pop() else { break };
                let rendered = done.close();
                match stack.last_mut().and_then(|parent| parent.children.as_mut()) {
                    Some(siblings) => siblings.push(rendered),
                    None => tree.push(rendered),
                }
            }
        }
        tree
    }

    /// Counts what the tree shows without the depth cap: revisit nodes are
    /// counted but not descended into
    fn measure(&self, roots: &[&ComponentNode]) -> HierarchyMetrics {
        let mut metrics = HierarchyMetrics::default();
        let mut stack: Vec<(&ComponentNode, usize)> = roots.iter().map(|&r| (r, 0)).collect();

        while let Some((node, depth)) = stack.pop() {
            metrics.total_components += 1;
            metrics.max_depth = metrics.max_depth.max(depth);
            if !node.is_revisit {
                stack.extend(self.children_of(node).map(|child| (child, depth + 1)));
            }
        }
        metrics
    }

    /// Self-attribution: blame a node only for growth its heaviest child does not explain
    ///
    /// A name is reported at most once, by the first node (pre-order, roots in
    /// mount order) that qualifies.
    fn find_leaking_suspects(&self, roots: &[&ComponentNode]) -> Vec<LeakSuspect> {
        let mut suspects = Vec::new();
        let mut flagged: AHashSet<&str> = AHashSet::new();
        let mut path: Vec<&str> = Vec::new();
        let mut steps: Vec<Step<'_>> = roots.iter().rev().map(|&r| Step::Enter(r)).collect();

        while let Some(step) = steps.pop() {
            let node = match step {
                Step::Enter(node) => node,
                Step::Leave => {
                    path.pop();
                    continue;
                }
            };
            path.push(node.name.as_str());

            let node_increase = node.memory_increase();
            let children_increase = self
                .children_of(node)
                .map(ComponentNode::memory_increase)
                .max()
                .unwrap_or(0);
            let real_increase = node_increase - children_increase;

            if real_increase > self.suspect_threshold && flagged.insert(node.name.as_str()) {
                suspects.push(LeakSuspect {
                    component_id: node.id.clone(),
                    component_name: node.name.clone(),
                    memory_increase: node_increase,
                    children_increase,
                    real_increase,
                    component_path: path.iter().map(|name| name.to_string()).collect(),
                });
            }

            steps.push(Step::Leave);
            steps.extend(self.children_of(node).rev().map(Step::Enter));
        }

        suspects.sort_by(|a, b| b.real_increase.cmp(&a.real_increase));
        suspects
    }
}

/// A node being rendered, with the children it still has to visit
struct RenderFrame<'a> {
    node: &'a ComponentNode,
    depth: usize,
    pending: std::slice::Iter<'a, NodeId>,
    children: Option<Vec<TreeNode>>,
}

impl<'a> RenderFrame<'a> {
    fn open(node: &'a ComponentNode, depth: usize) -> Self {
        let expand = !node.is_revisit && !node.children.is_empty() && depth < MAX_TREE_DEPTH;
        Self {
            node,
            depth,
            pending: node.children.iter(),
            children: expand.then(|| Vec::with_capacity(node.children.len())),
        }
    }

    fn close(self) -> TreeNode {
        TreeNode {
            id: self.node.id.clone(),
            name: self.node.name.clone(),
            mount_time: self.node.mount_time,
            unmount_time: self.node.unmount_time,
            memory_data: self.node.memory_summary(),
            children: self.children,
        }
    }
}

enum Step<'a> {
    Enter(&'a ComponentNode),
    Leave,
}

impl Default for ComponentHierarchyTracker {
    fn default() -> Self {
        Self::new()
    }
}
