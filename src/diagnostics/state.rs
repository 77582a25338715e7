/*!
 * Diagnostics State
 *
 * Every piece of mutable engine state in one owned aggregate: the hierarchy
 * (with its parent stack), per-name visit histories, the active set, the
 * trend detector's reported set, the session and the leaks raised in it.
 *
 * The monitor keeps this behind a single lock. Each method is one complete
 * mutation; callers sample memory before taking the lock.
 */

use super::session::{Session, SessionReport};
use crate::core::config::MonitorConfig;
use crate::core::id::NodeId;
use crate::core::types::{now_ms, Megabytes, Timestamp};
use crate::memory::MemoryInfo;
use crate::tracking::{
    ComponentHierarchyTracker, ComponentHistory, ComponentSummary, HierarchyReport, LeakAlert,
    Observation, TrendDetector, TrendThresholds,
};
use ahash::AHashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A mounted instance still under trend evaluation
#[derive(Debug, Clone)]
struct ActiveComponent {
    name: String,
    visit_index: usize,
}

pub struct DiagnosticsState {
    hierarchy: ComponentHierarchyTracker,
    histories: AHashMap<String, ComponentHistory>,
    active: AHashMap<NodeId, ActiveComponent>,
    detector: TrendDetector,
    session: Session,
    detected_leaks: AHashMap<String, LeakAlert>,
    loop_generation: u64,
    last_evaluation: Option<Instant>,
    evaluation_cadence: Duration,
}

impl DiagnosticsState {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            hierarchy: ComponentHierarchyTracker::with_threshold(config.significant_increase_mb),
            histories: AHashMap::new(),
            active: AHashMap::new(),
            detector: TrendDetector::new(TrendThresholds::from(config)),
            session: Session::default(),
            detected_leaks: AHashMap::new(),
            loop_generation: 0,
            last_evaluation: None,
            evaluation_cadence: config.evaluation_cadence,
        }
    }

    /// Invalidate the running loop; returns the generation for the next one
    pub fn next_generation(&mut self) -> u64 {
        self.loop_generation += 1;
        self.loop_generation
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.loop_generation
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[inline]
    pub fn is_session_active(&self) -> bool {
        self.session.is_active
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Start a fresh session, discarding everything from the previous one
    pub fn begin_session(&mut self, session: Session) {
        self.clear_session_data();
        self.session = session;
        info!(
            start = session.start_time,
            duration_ms = session.duration_ms,
            "session started"
        );
    }

    /// Deactivate, build the report, then clear per-session state
    pub fn end_session(&mut self, now: Timestamp) -> SessionReport {
        let hierarchy = self.hierarchy.generate_hierarchy_report();
        let components = self.component_summaries();
        let leaks_detected = self.detected_leaks();

        let report = SessionReport {
            session_start: self.session.start_time,
            session_end: now,
            duration_ms: self.session.duration_ms,
            elapsed_ms: self.session.elapsed_ms(now),
            components_analyzed: components.len(),
            components,
            hierarchy,
            leaks_detected,
        };

        info!(
            components = report.components_analyzed,
            suspects = report.hierarchy.leaking_suspects.len(),
            leaks = report.leaks_detected.len(),
            elapsed_ms = report.elapsed_ms,
            "session ended"
        );

        self.clear_session_data();
        self.session = Session::default();
        report
    }

    /// Mount `name` with a snapshot baselined at `baseline`
    pub fn mount(&mut self, name: &str, baseline: Megabytes) -> NodeId {
        let now = now_ms();
        let id = self.hierarchy.track_component(name);
        let snapshot = self.detector.new_snapshot(baseline);
        if let Some(node) = self.hierarchy.get_node_mut(&id) {
            node.memory_snapshot = Some(snapshot);
        }

        let visit_index = self
            .histories
            .entry(name.to_string())
            .or_default()
            .begin_visit(baseline, now);

        self.active.insert(
            id.clone(),
            ActiveComponent {
                name: name.to_string(),
                visit_index,
            },
        );
        id
    }

    /// Unmount an active instance
    ///
    /// `current` is a fresh reading if one could be taken; otherwise the
    /// node's last accepted reading closes the visit. Unknown or already
    /// stopped ids are a no-op returning false.
    pub fn unmount(&mut self, id: &NodeId, current: Option<Megabytes>) -> bool {
        let Some(active) = self.active.remove(id) else {
            return false;
        };
        let now = now_ms();

        let final_memory = current
            .or_else(|| {
                self.hierarchy
                    .get_node(id)
                    .and_then(|node| node.memory_snapshot.as_ref())
                    .map(|snapshot| snapshot.previous_memory)
            })
            .unwrap_or(0);

        self.hierarchy.untrack_component(id);
        if let Some(snapshot) = self
            .hierarchy
            .get_node_mut(id)
            .and_then(|node| node.memory_snapshot.as_mut())
        {
            snapshot.settle(final_memory, now);
        }

        let closed = self
            .histories
            .get_mut(&active.name)
            .map_or(false, |history| {
                history.close_visit(Some(active.visit_index), final_memory, now)
            });
        debug_assert!(closed, "active component without an open visit");

        self.detector.forget(id);
        debug!(
            component = %active.name,
            node_id = %id,
            final_mb = final_memory,
            "tracking stopped"
        );
        true
    }

    /// Apply one sample from loop `generation`
    ///
    /// Returns None when the loop has been superseded; otherwise the leak
    /// alerts raised by this sample, possibly none.
    pub fn apply_sample(
        &mut self,
        generation: u64,
        info: &MemoryInfo,
        at: Instant,
    ) -> Option<Vec<LeakAlert>> {
        if generation != self.loop_generation {
            return None;
        }
        if !self.session.is_active || !self.evaluation_due(at) {
            return Some(Vec::new());
        }
        self.last_evaluation = Some(at);

        let current = info.used_memory;
        let mut leaks = Vec::new();

        for (id, active) in &self.active {
            let Some(snapshot) = self
                .hierarchy
                .get_node_mut(id)
                .and_then(|node| node.memory_snapshot.as_mut())
            else {
                continue;
            };

            let observation = self
                .detector
                .observe(id, &active.name, snapshot, current, true);

            if let Some(visit) = self
                .histories
                .get_mut(&active.name)
                .and_then(|history| history.visit_mut(active.visit_index))
            {
                if observation.accepted() {
                    visit.record_reading(current);
                } else {
                    visit.peak_memory = visit.peak_memory.max(current);
                }
            }

            if let Observation::LeakDetected(alert) = observation {
                self.detected_leaks
                    .insert(alert.component_name.clone(), alert.clone());
                leaks.push(alert);
            }
        }

        Some(leaks)
    }

    /// Ticks jitter around the cadence, so a tenth of it is tolerated
    fn evaluation_due(&self, at: Instant) -> bool {
        let min_spacing = self.evaluation_cadence - self.evaluation_cadence / 10;
        match self.last_evaluation {
            Some(last) => at.saturating_duration_since(last) >= min_spacing,
            None => true,
        }
    }

    /// End the reporting epoch; readings and history stay
    pub fn reset_leak_tracking(&mut self) {
        self.detector.reset();
        debug!("leak tracking reset");
    }

    /// Leak alerts of the current session, latest per name, oldest first
    pub fn detected_leaks(&self) -> Vec<LeakAlert> {
        let mut leaks: Vec<LeakAlert> = self.detected_leaks.values().cloned().collect();
        leaks.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.component_name.cmp(&b.component_name))
        });
        leaks
    }

    pub fn hierarchy_report(&self) -> HierarchyReport {
        self.hierarchy.generate_hierarchy_report()
    }

    #[inline]
    pub fn hierarchy(&self) -> &ComponentHierarchyTracker {
        &self.hierarchy
    }

    pub fn history(&self, name: &str) -> Option<&ComponentHistory> {
        self.histories.get(name)
    }

    /// Per-name summaries, largest total change first
    pub fn component_summaries(&self) -> Vec<ComponentSummary> {
        let mut components: Vec<ComponentSummary> = self
            .histories
            .iter()
            .map(|(name, history)| history.summarize(name))
            .collect();
        components.sort_by(|a, b| {
            b.total_memory_change
                .cmp(&a.total_memory_change)
                .then_with(|| a.component_name.cmp(&b.component_name))
        });
        components
    }

    fn clear_session_data(&mut self) {
        self.hierarchy.reset();
        self.histories.clear();
        self.active.clear();
        self.detector.reset();
        self.detected_leaks.clear();
        self.last_evaluation = None;
    }
}
