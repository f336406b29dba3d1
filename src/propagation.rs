//! Forward/backward date propagation (critical path method).
//!
//! # Algorithm
//!
//! 1. **Forward pass** in topological order: each activity starts at the
//!    latest of its phase/project floor and every start constraint from its
//!    predecessors. Finish constraints are turned into start constraints
//!    (`finish - duration`) for fixed activities, or stretch the duration of
//!    flexible ones.
//! 2. **Backward pass** in reverse topological order: each activity finishes
//!    at the earliest of its phase/project ceiling and every finish limit
//!    implied by its successors' latest dates.
//!
//! Time is in whole days relative to the project start (the epoch).
//!
//! | Kind | Forward (successor ≥) | Backward (predecessor finish ≤) |
//! |------|----------------------|-------------------------------|
//! | FS | ES ≥ EF(p) | LF ≤ LS(s) |
//! | SS | ES ≥ ES(p) | LF ≤ LS(s) + d |
//! | FF | EF ≥ EF(p) | LF ≤ LF(s) |
//! | SF | EF ≥ ES(p) | LF ≤ LF(s) + d |
//!
//! # Complexity
//! O(V + E) for both passes.
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-Path Planning and Scheduling";
//! Fondahl (1961), precedence diagramming

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{Result, ScheduleError};
use crate::graph::{ActivityGraph, DependencyEdge, NodeIndex};
use crate::models::{
    date_at, days_between, ActivitySchedule, Anchor, DateWindow, Phase, Project, ScheduleBound,
    ScheduleLink, ScheduleResult, Violation,
};
use crate::validation::TopoOrder;

/// Fixed date bounds for one run: the project window and its phase windows.
#[derive(Debug, Clone)]
pub struct ScheduleBounds {
    project: String,
    project_window: DateWindow,
    phases: HashMap<String, DateWindow>,
}

impl ScheduleBounds {
    /// Creates bounds for `project` with no phases yet.
    pub fn new(project: impl Into<String>, project_window: DateWindow) -> Self {
        Self {
            project: project.into(),
            project_window,
            phases: HashMap::new(),
        }
    }

    /// Adds a phase window.
    pub fn with_phase(mut self, phase: impl Into<String>, window: DateWindow) -> Self {
        self.phases.insert(phase.into(), window);
        self
    }

    /// Collects bounds from the project and phase records.
    pub fn from_records(project: &Project, phases: &[Phase]) -> Self {
        phases.iter().fold(
            Self::new(project.code.clone(), project.window()),
            |bounds, phase| bounds.with_phase(phase.code.clone(), phase.window()),
        )
    }

    /// Day 0 of the schedule (the project start).
    pub fn epoch(&self) -> NaiveDate {
        self.project_window.start
    }

    /// The project window.
    pub fn project_window(&self) -> DateWindow {
        self.project_window
    }

    /// A phase window by code.
    pub fn phase(&self, code: &str) -> Option<&DateWindow> {
        self.phases.get(code)
    }

    /// Phases whose window is not enclosed by the project window, sorted by phase code.
    pub fn violations(&self) -> Vec<Violation> {
        let mut codes: Vec<&String> = self.phases.keys().collect();
        codes.sort();

        let mut violations = Vec::new();
        for code in codes {
            let window = &self.phases[code];
            if self.project_window.encloses(window) {
                continue;
            }
            if window.start < self.project_window.start {
                violations.push(Violation::phase_starts_before_project(
                    code.as_str(),
                    window.start,
                    self.project_window.start,
                ));
            }
            if window.end > self.project_window.end {
                violations.push(Violation::phase_ends_after_project(
                    code.as_str(),
                    window.end,
                    self.project_window.end,
                ));
            }
        }
        violations
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CeilingSource {
    Phase,
    Project,
}

/// Day-offset limits of one node: phase ∩ project.
#[derive(Debug, Clone, Copy)]
struct Limits {
    floor: i64,
    ceiling: i64,
    ceiling_source: CeilingSource,
}

fn resolve_limits(graph: &ActivityGraph, bounds: &ScheduleBounds) -> Result<Vec<Limits>> {
    let epoch = bounds.epoch();
    let project_end = days_between(epoch, bounds.project_window.end);
    let mut cache: HashMap<&str, Limits> = HashMap::new();

    graph
        .nodes()
        .iter()
        .map(|node| {
            if let Some(limits) = cache.get(node.phase.as_str()) {
                return Ok(*limits);
            }
            let window = bounds
                .phase(&node.phase)
                .ok_or_else(|| ScheduleError::UnknownPhase {
                    phase: node.phase.clone(),
                    referenced_by: node.code.clone(),
                })?;
            let phase_end = days_between(epoch, window.end);
            let (ceiling, ceiling_source) = if phase_end <= project_end {
                (phase_end, CeilingSource::Phase)
            } else {
                (project_end, CeilingSource::Project)
            };
            let limits = Limits {
                floor: days_between(epoch, window.start).max(0),
                ceiling,
                ceiling_source,
            };
            cache.insert(node.phase.as_str(), limits);
            Ok(limits)
        })
        .collect()
}

fn ceiling_bound(
    graph: &ActivityGraph,
    bounds: &ScheduleBounds,
    node: NodeIndex,
    limits: &Limits,
) -> ScheduleBound {
    let date = date_at(bounds.epoch(), limits.ceiling);
    match limits.ceiling_source {
        CeilingSource::Phase => ScheduleBound::PhaseEnd {
            phase: graph.node(node).phase.clone(),
            date,
        },
        CeilingSource::Project => ScheduleBound::ProjectEnd {
            project: bounds.project.clone(),
            date,
        },
    }
}

/// Computes earliest and latest dates for every activity.
///
/// `order` must come from [`validate_acyclic`](crate::validation::validate_acyclic)
/// on the same graph.
///
/// # Errors
/// - [`ScheduleError::UnknownPhase`] if an activity's phase has no bounds.
/// - [`ScheduleError::InfeasibleSchedule`] if an earliest start exceeds the
///   activity's end ceiling, or if after the backward pass an activity's
///   earliest start exceeds its latest start. The error names the activity
///   and the bound that limited its latest dates.
pub fn propagate(
    order: &TopoOrder,
    graph: &ActivityGraph,
    bounds: &ScheduleBounds,
) -> Result<ScheduleResult> {
    debug_assert_eq!(order.len(), graph.node_count());

    let n = graph.node_count();
    let epoch = bounds.epoch();
    let limits = resolve_limits(graph, bounds)?;

    let mut durations: Vec<i64> = graph.nodes().iter().map(|a| a.duration_days).collect();
    let mut es = vec![0i64; n];
    let mut ef = vec![0i64; n];

    // Forward pass
    for &node in order.iter() {
        let lim = &limits[node];
        let mut start = lim.floor;
        let mut finish_floor: Option<i64> = None;

        for edge in graph.incoming(node) {
            let p = edge.predecessor;
            let value = match edge.kind.predecessor_anchor() {
                Anchor::Start => es[p],
                Anchor::Finish => ef[p],
            };
            match edge.kind.successor_anchor() {
                Anchor::Start => start = start.max(value),
                Anchor::Finish => {
                    finish_floor = Some(finish_floor.map_or(value, |f| f.max(value)));
                }
            }
        }

        let mut finish = start + durations[node];
        if let Some(required) = finish_floor {
            if required > finish {
                if graph.node(node).flexible {
                    finish = required;
                } else {
                    start = required - durations[node];
                    finish = required;
                }
            }
        }

        if start > lim.ceiling {
            return Err(ScheduleError::InfeasibleSchedule {
                activity_id: graph.node(node).code.clone(),
                bound: ceiling_bound(graph, bounds, node, lim),
            });
        }

        durations[node] = finish - start;
        es[node] = start;
        ef[node] = finish;
    }

    // Backward pass
    let mut ls = vec![0i64; n];
    let mut lf = vec![0i64; n];
    for &node in order.iter().rev() {
        let d = durations[node];
        let lim = &limits[node];
        let mut finish = lim.ceiling;
        let mut binding: Option<&DependencyEdge> = None;

        for edge in graph.outgoing(node) {
            let s = edge.successor;
            let value = match edge.kind.successor_anchor() {
                Anchor::Start => ls[s],
                Anchor::Finish => lf[s],
            };
            let limit = match edge.kind.predecessor_anchor() {
                Anchor::Finish => value,
                Anchor::Start => value + d,
            };
            if limit < finish {
                finish = limit;
                binding = Some(edge);
            }
        }

        lf[node] = finish;
        ls[node] = finish - d;

        if es[node] > ls[node] {
            let bound = match binding {
                Some(edge) => ScheduleBound::Successor {
                    activity_id: graph.node(edge.successor).code.clone(),
                    kind: edge.kind,
                    date: date_at(epoch, finish),
                },
                None => ceiling_bound(graph, bounds, node, lim),
            };
            return Err(ScheduleError::InfeasibleSchedule {
                activity_id: graph.node(node).code.clone(),
                bound,
            });
        }
    }

    let violations = bounds.violations();
    for v in &violations {
        warn!(entity = %v.entity_id, "{}", v.message);
    }

    let activities = graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, node)| ActivitySchedule {
            code: node.code.clone(),
            phase: node.phase.clone(),
            duration_days: durations[i],
            earliest_start: es[i],
            earliest_finish: ef[i],
            latest_start: ls[i],
            latest_finish: lf[i],
        })
        .collect();

    let links = graph
        .edges()
        .iter()
        .map(|e| ScheduleLink {
            predecessor: e.predecessor,
            successor: e.successor,
            kind: e.kind,
        })
        .collect();

    debug!(
        activities = n,
        completion = ef.iter().copied().max().unwrap_or(0),
        "propagation complete"
    );

    Ok(ScheduleResult {
        epoch,
        activities,
        links,
        order: order.as_slice().to_vec(),
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::models::{Activity, Dependency, ViolationType};
    use crate::validation::validate_acyclic;

    fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn day(n: i64) -> NaiveDate {
        date_at(epoch(), n)
    }

    fn act(code: &str, duration: i64) -> Activity {
        Activity::new(code, "PH", day(0), day(duration))
    }

    fn bounds(phase_end: i64) -> ScheduleBounds {
        ScheduleBounds::new("P", DateWindow::new(day(0), day(100)))
            .with_phase("PH", DateWindow::new(day(0), day(phase_end)))
    }

    fn run_with(
        acts: &[Activity],
        deps: &[Dependency],
        bounds: &ScheduleBounds,
    ) -> Result<ScheduleResult> {
        let g = build_graph(acts, deps)?;
        let order = validate_acyclic(&g)?;
        propagate(&order, &g, bounds)
    }

    fn run(acts: &[Activity], deps: &[Dependency], phase_end: i64) -> Result<ScheduleResult> {
        run_with(acts, deps, &bounds(phase_end))
    }

    fn dates(result: &ScheduleResult, code: &str) -> (i64, i64, i64, i64) {
        let a = result.activity(code).unwrap();
        (
            a.earliest_start,
            a.earliest_finish,
            a.latest_start,
            a.latest_finish,
        )
    }

    #[test]
    fn test_finish_to_start_chain_with_slack() {
        let acts = vec![act("A", 5), act("B", 5)];
        let deps = vec![Dependency::finish_to_start("B", "A")];
        let r = run(&acts, &deps, 20).unwrap();

        assert_eq!(dates(&r, "A"), (0, 5, 10, 15));
        assert_eq!(dates(&r, "B"), (5, 10, 15, 20));
        assert_eq!(r.completion(), 10);
    }

    #[test]
    fn test_finish_to_start_chain_tight() {
        let acts = vec![act("A", 5), act("B", 5)];
        let deps = vec![Dependency::finish_to_start("B", "A")];
        let r = run(&acts, &deps, 10).unwrap();

        assert_eq!(dates(&r, "A"), (0, 5, 0, 5));
        assert_eq!(dates(&r, "B"), (5, 10, 5, 10));
    }

    #[test]
    fn test_finish_to_start_binds_exactly() {
        let acts = vec![act("A", 10), act("B", 3)];
        let deps = vec![Dependency::finish_to_start("B", "A")];
        let r = run(&acts, &deps, 50).unwrap();
        assert_eq!(r.activity("A").unwrap().earliest_finish, 10);
        assert_eq!(r.activity("B").unwrap().earliest_start, 10);
    }

    #[test]
    fn test_start_to_start() {
        let acts = vec![act("X", 2), act("A", 5), act("B", 3)];
        let deps = vec![
            Dependency::finish_to_start("A", "X"),
            Dependency::start_to_start("B", "A"),
        ];
        let r = run(&acts, &deps, 20).unwrap();
        assert_eq!(dates(&r, "B"), (2, 5, 17, 20));
        // A's latest finish is capped by the phase, not by SS (LS(B) + 5 = 22).
        assert_eq!(dates(&r, "A"), (2, 7, 15, 20));
    }

    #[test]
    fn test_finish_to_finish_moves_fixed_start() {
        let acts = vec![act("A", 5), act("B", 2)];
        let deps = vec![Dependency::finish_to_finish("B", "A")];
        let r = run(&acts, &deps, 20).unwrap();
        assert_eq!(dates(&r, "B"), (3, 5, 18, 20));
        assert_eq!(dates(&r, "A"), (0, 5, 15, 20));
    }

    #[test]
    fn test_start_to_finish() {
        let acts = vec![act("X", 4), act("A", 1), act("B", 2)];
        let deps = vec![
            Dependency::finish_to_start("A", "X"),
            Dependency::start_to_finish("B", "A"),
        ];
        let r = run(&acts, &deps, 10).unwrap();
        // EF(B) >= ES(A) = 4, so B starts at 2.
        assert_eq!(dates(&r, "B"), (2, 4, 8, 10));
        // LF(A) <= LF(B) + d(A) = 11, capped to 10 by the phase.
        assert_eq!(dates(&r, "A"), (4, 5, 9, 10));
    }

    #[test]
    fn test_flexible_activity_stretches() {
        let acts = vec![act("A", 5), act("B", 2).flexible()];
        let deps = vec![Dependency::finish_to_finish("B", "A")];
        let r = run(&acts, &deps, 20).unwrap();
        let b = r.activity("B").unwrap();
        assert_eq!((b.earliest_start, b.earliest_finish), (0, 5));
        assert_eq!(b.duration_days, 5);
        assert_eq!(b.start_float(), b.finish_float());
    }

    #[test]
    fn test_flexible_without_finish_constraint_keeps_duration() {
        let acts = vec![act("A", 5), act("C", 2).flexible()];
        let deps = vec![Dependency::finish_to_start("C", "A")];
        let r = run(&acts, &deps, 20).unwrap();
        assert_eq!(dates(&r, "C"), (5, 7, 18, 20));
    }

    #[test]
    fn test_max_over_incoming_edges() {
        let acts = vec![act("A", 5), act("B", 8), act("C", 2)];
        let deps = vec![
            Dependency::finish_to_start("C", "A"),
            Dependency::finish_to_start("C", "B"),
        ];
        let r = run(&acts, &deps, 20).unwrap();
        assert_eq!(r.activity("C").unwrap().earliest_start, 8);
        // A is bounded by C's latest start (18), B too.
        assert_eq!(dates(&r, "A"), (0, 5, 13, 18));
        assert_eq!(dates(&r, "B"), (0, 8, 10, 18));
    }

    #[test]
    fn test_min_over_outgoing_edges() {
        let acts = vec![act("A", 2), act("B", 3), act("C", 6)];
        let deps = vec![
            Dependency::finish_to_start("B", "A"),
            Dependency::finish_to_start("C", "A"),
        ];
        let r = run(&acts, &deps, 12).unwrap();
        // LS(B) = 9, LS(C) = 6: the tighter one wins.
        assert_eq!(r.activity("A").unwrap().latest_finish, 6);
    }

    #[test]
    fn test_milestone() {
        let acts = vec![act("A", 5), act("M", 0)];
        let deps = vec![Dependency::finish_to_start("M", "A")];
        let r = run(&acts, &deps, 5).unwrap();
        let m = r.activity("M").unwrap();
        assert_eq!(m.earliest_start, m.earliest_finish);
        assert_eq!(dates(&r, "M"), (5, 5, 5, 5));
    }

    #[test]
    fn test_phase_start_is_floor() {
        let acts = vec![Activity::new("A", "LATE", day(0), day(3))];
        let b = ScheduleBounds::new("P", DateWindow::new(day(0), day(30)))
            .with_phase("LATE", DateWindow::new(day(7), day(30)));
        let r = run_with(&acts, &[], &b).unwrap();
        assert_eq!(dates(&r, "A"), (7, 10, 27, 30));
    }

    #[test]
    fn test_cross_phase_edge_uses_each_phase() {
        let acts = vec![
            Activity::new("A", "P1", day(0), day(4)),
            Activity::new("B", "P2", day(0), day(2)),
        ];
        let deps = vec![Dependency::finish_to_start("B", "A")];
        let b = ScheduleBounds::new("P", DateWindow::new(day(0), day(30)))
            .with_phase("P1", DateWindow::new(day(0), day(10)))
            .with_phase("P2", DateWindow::new(day(6), day(20)));
        let r = run_with(&acts, &deps, &b).unwrap();
        assert_eq!(dates(&r, "B"), (6, 8, 18, 20));
        assert_eq!(dates(&r, "A"), (0, 4, 6, 10));
    }

    #[test]
    fn test_infeasible_forward_names_phase_end() {
        let acts = vec![act("A", 11), act("B", 2)];
        let deps = vec![Dependency::finish_to_start("B", "A")];
        let err = run(&acts, &deps, 10).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::InfeasibleSchedule {
                activity_id: "B".into(),
                bound: ScheduleBound::PhaseEnd {
                    phase: "PH".into(),
                    date: day(10),
                },
            }
        );
    }

    #[test]
    fn test_infeasible_backward_names_overflowing_activity() {
        let acts = vec![act("A", 5), act("B", 8)];
        let deps = vec![Dependency::finish_to_start("B", "A")];
        match run(&acts, &deps, 10).unwrap_err() {
            ScheduleError::InfeasibleSchedule { activity_id, bound } => {
                assert_eq!(activity_id, "B");
                assert_eq!(bound.date(), day(10));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_project_end_tighter_than_phase() {
        let acts = vec![act("A", 5), act("B", 5)];
        let deps = vec![Dependency::finish_to_start("B", "A")];
        let b = ScheduleBounds::new("P", DateWindow::new(day(0), day(8)))
            .with_phase("PH", DateWindow::new(day(0), day(20)));
        let err = run_with(&acts, &deps, &b).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::InfeasibleSchedule {
                activity_id: "B".into(),
                bound: ScheduleBound::ProjectEnd {
                    project: "P".into(),
                    date: day(8),
                },
            }
        );
    }

    #[test]
    fn test_phase_outside_project_is_reported() {
        let acts = vec![act("A", 3)];
        let b = ScheduleBounds::new("P", DateWindow::new(day(0), day(30)))
            .with_phase("PH", DateWindow::new(day(-2), day(40)));
        let r = run_with(&acts, &[], &b).unwrap();

        assert_eq!(r.violations.len(), 2);
        assert_eq!(
            r.violations[0].violation_type,
            ViolationType::PhaseStartsBeforeProject
        );
        assert_eq!(
            r.violations[1].violation_type,
            ViolationType::PhaseEndsAfterProject
        );
        // Activities still stay inside the project window.
        assert_eq!(dates(&r, "A"), (0, 3, 27, 30));
    }

    #[test]
    fn test_phase_sharing_project_edges_is_enclosed() {
        let b = ScheduleBounds::new("P", DateWindow::new(day(0), day(30)))
            .with_phase("EDGE", DateWindow::new(day(0), day(30)))
            .with_phase("INNER", DateWindow::new(day(5), day(10)))
            .with_phase("LATE", DateWindow::new(day(20), day(31)));
        let v = b.violations();
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].entity_id, "LATE");
        assert_eq!(v[0].violation_type, ViolationType::PhaseEndsAfterProject);
    }

    #[test]
    fn test_unknown_phase() {
        let acts = vec![Activity::new("A", "NOPE", day(0), day(1))];
        let err = run(&acts, &[], 10).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::UnknownPhase {
                phase: "NOPE".into(),
                referenced_by: "A".into(),
            }
        );
    }

    #[test]
    fn test_bounds_from_records() {
        let project = Project::new("P", day(0), day(30));
        let phases = vec![
            Phase::new("PH1", "P", day(0), day(10)),
            Phase::new("PH2", "P", day(10), day(30)),
        ];
        let b = ScheduleBounds::from_records(&project, &phases);
        assert_eq!(b.epoch(), day(0));
        assert_eq!(b.phase("PH2").unwrap().start, day(10));
        assert!(b.violations().is_empty());
    }
}
