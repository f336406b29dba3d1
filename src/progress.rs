//! Duration-weighted progress roll-up.
//!
//! Progress flows bottom-up through an arena tree:
//!
//! ```text
//! Project ── Phase ── Activity ── Sub-activity ── ...
//! ```
//!
//! Leaf activities carry the authoritative values. Every node with children
//! is overwritten by the duration-weighted mean of its children; phases and
//! projects without children keep their own stored value. Zero-duration
//! nodes weigh the configured minimum (1 day by default).
//!
//! The traversal is an explicit post-order over indices, so arbitrarily deep
//! sub-activity nesting never grows the call stack.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScheduleError};
use crate::models::{Activity, Phase, Project};

/// Level of a node in the progress tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLevel {
    Project,
    Phase,
    Activity,
}

#[derive(Debug, Clone)]
struct ProgressNode {
    level: ProgressLevel,
    code: String,
    duration_days: i64,
    progress: f64,
    children: Vec<usize>,
}

/// Arena tree of one project's progress-bearing records.
///
/// Node 0 is the project.
#[derive(Debug, Clone)]
pub struct ProgressTree {
    nodes: Vec<ProgressNode>,
    min_weight: i64,
}

impl ProgressTree {
    /// Builds the tree from a project's records.
    ///
    /// # Errors
    /// - [`ScheduleError::ForeignPhase`] for a phase of another project.
    /// - [`ScheduleError::UnknownPhase`] for an activity of a missing phase.
    /// - [`ScheduleError::DuplicateActivity`] for repeated activity codes.
    /// - [`ScheduleError::UnknownActivityReference`] for a missing parent.
    /// - [`ScheduleError::DuplicatePhase`] for repeated phase codes.
    /// - [`ScheduleError::ProgressOutOfRange`] for any progress above 100.
    /// - [`ScheduleError::InvalidActivity`] for a parent in another phase.
    /// - [`ScheduleError::HierarchyCycle`] if parent links loop.
    pub fn build(project: &Project, phases: &[Phase], activities: &[Activity]) -> Result<Self> {
        check_progress(&project.code, project.progress)?;
        let mut nodes = Vec::with_capacity(1 + phases.len() + activities.len());
        nodes.push(ProgressNode {
            level: ProgressLevel::Project,
            code: project.code.clone(),
            duration_days: project.window().duration_days(),
            progress: f64::from(project.progress),
            children: Vec::new(),
        });

        let mut phase_index = HashMap::with_capacity(phases.len());
        for phase in phases {
            if phase.project != project.code {
                return Err(ScheduleError::ForeignPhase {
                    phase: phase.code.clone(),
                    owner: phase.project.clone(),
                    project: project.code.clone(),
                });
            }
            check_progress(&phase.code, phase.progress)?;
            let idx = nodes.len();
            if phase_index.insert(phase.code.as_str(), idx).is_some() {
                return Err(ScheduleError::DuplicatePhase {
                    phase: phase.code.clone(),
                });
            }
            nodes.push(ProgressNode {
                level: ProgressLevel::Phase,
                code: phase.code.clone(),
                duration_days: phase.window().duration_days(),
                progress: f64::from(phase.progress),
                children: Vec::new(),
            });
            nodes[0].children.push(idx);
        }

        let first_activity = nodes.len();
        let mut activity_index = HashMap::with_capacity(activities.len());
        for (i, act) in activities.iter().enumerate() {
            check_progress(&act.code, act.progress)?;
            if !phase_index.contains_key(act.phase.as_str()) {
                return Err(ScheduleError::UnknownPhase {
                    phase: act.phase.clone(),
                    referenced_by: act.code.clone(),
                });
            }
            if activity_index
                .insert(act.code.as_str(), first_activity + i)
                .is_some()
            {
                return Err(ScheduleError::DuplicateActivity {
                    activity_id: act.code.clone(),
                });
            }
            nodes.push(ProgressNode {
                level: ProgressLevel::Activity,
                code: act.code.clone(),
                duration_days: act.duration_days(),
                progress: f64::from(act.progress),
                children: Vec::new(),
            });
        }

        // Resolve parents: `parent_of[i]` for activity i.
        let mut parent_of: Vec<Option<usize>> = vec![None; activities.len()];
        for (i, act) in activities.iter().enumerate() {
            let Some(parent) = act.parent.as_deref() else {
                continue;
            };
            let parent_idx = *activity_index.get(parent).ok_or_else(|| {
                ScheduleError::UnknownActivityReference {
                    activity_id: parent.to_string(),
                    referenced_by: act.code.clone(),
                }
            })?;
            let parent_act = &activities[parent_idx - first_activity];
            if parent_act.phase != act.phase {
                return Err(ScheduleError::InvalidActivity {
                    activity_id: act.code.clone(),
                    reason: format!(
                        "parent '{}' is in phase '{}', not '{}'",
                        parent, parent_act.phase, act.phase
                    ),
                });
            }
            parent_of[i] = Some(parent_idx - first_activity);
        }
        check_hierarchy(activities, &parent_of)?;

        for (i, act) in activities.iter().enumerate() {
            let owner = match parent_of[i] {
                Some(p) => first_activity + p,
                None => phase_index[act.phase.as_str()],
            };
            nodes[owner].children.push(first_activity + i);
        }
        for idx in 0..nodes.len() {
            let mut children = std::mem::take(&mut nodes[idx].children);
            children.sort_by(|&a, &b| nodes[a].code.cmp(&nodes[b].code));
            nodes[idx].children = children;
        }

        Ok(Self {
            nodes,
            min_weight: 1,
        })
    }

    /// Sets the weight used for zero-duration nodes (at least 1).
    pub fn with_min_weight(mut self, min_weight: i64) -> Self {
        self.min_weight = min_weight.max(1);
        self
    }

    /// Number of nodes (project + phases + activities).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the project node is always present.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Updates a leaf activity's progress. Returns `false` if the code is
    /// unknown, names an activity with sub-activities (whose value is derived),
    /// or `progress` is above 100.
    pub fn set_activity_progress(&mut self, code: &str, progress: u8) -> bool {
        match self
            .nodes
            .iter_mut()
            .find(|n| n.level == ProgressLevel::Activity && n.code == code)
        {
            Some(node) if node.children.is_empty() && progress <= 100 => {
                node.progress = f64::from(progress);
                true
            }
            _ => false,
        }
    }

    /// Writes a roll-up back into the tree, as the records layer would.
    pub fn apply(&mut self, rollup: &ProgressRollup) {
        for node in &mut self.nodes {
            let value = match node.level {
                ProgressLevel::Project => Some(rollup.project),
                ProgressLevel::Phase => rollup.phases.get(&node.code).copied(),
                ProgressLevel::Activity => rollup.activities.get(&node.code).copied(),
            };
            if let Some(v) = value {
                node.progress = f64::from(v);
            }
        }
    }

    fn weight(&self, idx: usize) -> f64 {
        match self.nodes[idx].duration_days {
            d if d > 0 => d as f64,
            _ => self.min_weight as f64,
        }
    }
}

fn check_progress(entity_id: &str, progress: u8) -> Result<()> {
    if progress > 100 {
        return Err(ScheduleError::ProgressOutOfRange {
            entity_id: entity_id.to_string(),
            progress,
        });
    }
    Ok(())
}

fn check_hierarchy(activities: &[Activity], parent_of: &[Option<usize>]) -> Result<()> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        Visiting,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; activities.len()];
    for start in 0..activities.len() {
        let mut chain: Vec<usize> = Vec::new();
        let mut cursor = Some(start);
        while let Some(i) = cursor {
            match marks[i] {
                Mark::Done => break,
                Mark::Visiting => {
                    let from = chain.iter().position(|&c| c == i).unwrap_or(0);
                    let cycle = chain[from..]
                        .iter()
                        .map(|&c| activities[c].code.clone())
                        .collect();
                    return Err(ScheduleError::HierarchyCycle { cycle });
                }
                Mark::Unvisited => {
                    marks[i] = Mark::Visiting;
                    chain.push(i);
                    cursor = parent_of[i];
                }
            }
        }
        for i in chain {
            marks[i] = Mark::Done;
        }
    }
    Ok(())
}

/// Rolled-up progress values, rounded to whole percent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressRollup {
    /// Project progress.
    pub project: u8,
    /// Progress per phase code.
    pub phases: BTreeMap<String, u8>,
    /// Progress per activity code (leaves unchanged, parents derived).
    pub activities: BTreeMap<String, u8>,
}

impl ProgressRollup {
    /// Progress of a phase by code.
    pub fn phase(&self, code: &str) -> Option<u8> {
        self.phases.get(code).copied()
    }

    /// Progress of an activity by code.
    pub fn activity(&self, code: &str) -> Option<u8> {
        self.activities.get(code).copied()
    }
}

/// Computes duration-weighted progress for every node of the tree.
///
/// Means are taken over exact (unrounded) child values; rounding happens
/// once, on output. Running it again after [`ProgressTree::apply`] with
/// unchanged leaves yields the same roll-up.
pub fn aggregate_progress(tree: &ProgressTree) -> ProgressRollup {
    let n = tree.nodes.len();
    let mut value: Vec<f64> = tree.nodes.iter().map(|node| node.progress).collect();

    // Post-order: (node, children already pushed)
    let mut stack = vec![(0usize, false)];
    while let Some((idx, expanded)) = stack.pop() {
        let node = &tree.nodes[idx];
        if !expanded {
            stack.push((idx, true));
            stack.extend(node.children.iter().map(|&c| (c, false)));
            continue;
        }
        if node.children.is_empty() {
            continue;
        }
        let (mut weighted, mut total) = (0.0, 0.0);
        for &child in &node.children {
            let w = tree.weight(child);
            weighted += value[child] * w;
            total += w;
        }
        value[idx] = weighted / total;
    }

    let mut rollup = ProgressRollup::default();
    for (idx, node) in tree.nodes.iter().enumerate() {
        let percent = value[idx].round().clamp(0.0, 100.0) as u8;
        match node.level {
            ProgressLevel::Project => rollup.project = percent,
            ProgressLevel::Phase => {
                rollup.phases.insert(node.code.clone(), percent);
            }
            ProgressLevel::Activity => {
                rollup.activities.insert(node.code.clone(), percent);
            }
        }
    }

    debug!(
        nodes = n,
        project = rollup.project,
        "progress roll-up complete"
    );
    rollup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::date_at;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn day(n: i64) -> NaiveDate {
        date_at(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), n)
    }

    fn project() -> Project {
        Project::new("P", day(0), day(30))
    }

    fn act(code: &str, phase: &str, duration: i64, progress: u8) -> Activity {
        Activity::new(code, phase, day(0), day(duration)).with_progress(progress)
    }

    #[test]
    fn test_phase_weighted_mean() {
        let phases = vec![Phase::new("PH", "P", day(0), day(10))];
        let acts = vec![act("A", "PH", 3, 100), act("B", "PH", 1, 0)];
        let tree = ProgressTree::build(&project(), &phases, &acts).unwrap();
        let r = aggregate_progress(&tree);

        // (100*3 + 0*1) / 4 = 75
        assert_eq!(r.phase("PH"), Some(75));
        assert_eq!(r.project, 75);
    }

    #[test]
    fn test_project_weights_phases_by_duration() {
        let phases = vec![
            Phase::new("PH1", "P", day(0), day(10)),
            Phase::new("PH2", "P", day(10), day(40)),
        ];
        let acts = vec![act("A", "PH1", 5, 100), act("B", "PH2", 5, 0)];
        let tree = ProgressTree::build(&project(), &phases, &acts).unwrap();
        let r = aggregate_progress(&tree);
        // (100*10 + 0*30) / 40 = 25
        assert_eq!(r.project, 25);
    }

    #[test]
    fn test_sub_activities_override_parent() {
        let phases = vec![Phase::new("PH", "P", day(0), day(10))];
        let acts = vec![
            act("PARENT", "PH", 4, 10),
            act("C1", "PH", 1, 100).with_parent("PARENT"),
            act("C2", "PH", 3, 0).with_parent("PARENT"),
            act("G1", "PH", 2, 50).with_parent("C2"),
        ];
        let tree = ProgressTree::build(&project(), &phases, &acts).unwrap();
        let r = aggregate_progress(&tree);

        // C2 has a single child G1 -> 50; PARENT = (100*1 + 50*3) / 4 = 62.5
        assert_eq!(r.activity("C2"), Some(50));
        assert_eq!(r.activity("PARENT"), Some(63));
        assert_eq!(r.activity("G1"), Some(50));
        // Only the top-level activity weighs into the phase.
        assert_eq!(r.phase("PH"), Some(63));
    }

    #[test]
    fn test_milestone_weighs_minimum() {
        let phases = vec![Phase::new("PH", "P", day(0), day(10))];
        let acts = vec![act("A", "PH", 1, 0), act("M", "PH", 0, 100)];
        let tree = ProgressTree::build(&project(), &phases, &acts).unwrap();
        assert_eq!(aggregate_progress(&tree).phase("PH"), Some(50));

        let heavy = tree.with_min_weight(3);
        // (0*1 + 100*3) / 4 = 75
        assert_eq!(aggregate_progress(&heavy).phase("PH"), Some(75));
    }

    #[test]
    fn test_childless_phase_and_project_keep_own_value() {
        let phases = vec![
            Phase::new("EMPTY", "P", day(0), day(10)).with_progress(40),
            Phase::new("FULL", "P", day(0), day(10)),
        ];
        let acts = vec![act("A", "FULL", 2, 80)];
        let tree = ProgressTree::build(&project(), &phases, &acts).unwrap();
        let r = aggregate_progress(&tree);
        assert_eq!(r.phase("EMPTY"), Some(40));
        assert_eq!(r.phase("FULL"), Some(80));
        assert_eq!(r.project, 60);

        let lonely = ProgressTree::build(&project().with_progress(33), &[], &[]).unwrap();
        assert_eq!(aggregate_progress(&lonely).project, 33);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let phases = vec![
            Phase::new("PH1", "P", day(0), day(7)),
            Phase::new("PH2", "P", day(7), day(20)),
        ];
        let acts = vec![
            act("A", "PH1", 3, 17),
            act("A1", "PH1", 1, 90).with_parent("A"),
            act("A2", "PH1", 2, 33).with_parent("A"),
            act("B", "PH2", 0, 100),
            act("C", "PH2", 7, 41),
        ];
        let mut tree = ProgressTree::build(&project(), &phases, &acts).unwrap();
        let first = aggregate_progress(&tree);
        tree.apply(&first);
        let second = aggregate_progress(&tree);
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_trees_idempotent_and_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..30 {
            let phases = vec![
                Phase::new("PH1", "P", day(0), day(rng.random_range(0..15))),
                Phase::new("PH2", "P", day(0), day(rng.random_range(0..15))),
            ];
            let count: usize = rng.random_range(1..25);
            let mut acts = Vec::new();
            for i in 0..count {
                let phase = if i % 2 == 0 { "PH1" } else { "PH2" };
                let mut a = act(
                    &format!("A{i:02}"),
                    phase,
                    rng.random_range(0..10),
                    rng.random_range(0..=100),
                );
                // Parent must be an earlier activity of the same phase.
                if i >= 2 && rng.random_bool(0.5) {
                    let parent = i - 2 * rng.random_range(1..=i / 2);
                    a = a.with_parent(format!("A{parent:02}"));
                }
                acts.push(a);
            }

            let mut tree = ProgressTree::build(&project(), &phases, &acts).unwrap();
            let first = aggregate_progress(&tree);
            assert!(first.project <= 100);
            assert!(first.phases.values().all(|&v| v <= 100));
            tree.apply(&first);
            assert_eq!(aggregate_progress(&tree), first);
        }
    }

    #[test]
    fn test_set_activity_progress_triggers_new_rollup() {
        let phases = vec![Phase::new("PH", "P", day(0), day(10))];
        let acts = vec![
            act("PARENT", "PH", 2, 0),
            act("LEAF", "PH", 2, 0).with_parent("PARENT"),
        ];
        let mut tree = ProgressTree::build(&project(), &phases, &acts).unwrap();
        assert!(!tree.set_activity_progress("PARENT", 100));
        assert!(!tree.set_activity_progress("NOPE", 100));
        assert!(!tree.set_activity_progress("LEAF", 101));
        assert!(tree.set_activity_progress("LEAF", 100));
        let r = aggregate_progress(&tree);
        assert_eq!(r.activity("PARENT"), Some(100));
        assert_eq!(r.project, 100);
    }

    #[test]
    fn test_hierarchy_cycle() {
        let phases = vec![Phase::new("PH", "P", day(0), day(10))];
        let acts = vec![
            act("A", "PH", 1, 0).with_parent("B"),
            act("B", "PH", 1, 0).with_parent("A"),
        ];
        match ProgressTree::build(&project(), &phases, &acts).unwrap_err() {
            ScheduleError::HierarchyCycle { cycle } => assert_eq!(cycle, vec!["A", "B"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_build_rejects_bad_references() {
        let phases = vec![Phase::new("PH", "P", day(0), day(10))];

        let missing_parent = vec![act("A", "PH", 1, 0).with_parent("GHOST")];
        assert!(matches!(
            ProgressTree::build(&project(), &phases, &missing_parent),
            Err(ScheduleError::UnknownActivityReference { .. })
        ));

        let unknown_phase = vec![act("A", "NOPE", 1, 0)];
        assert!(matches!(
            ProgressTree::build(&project(), &phases, &unknown_phase),
            Err(ScheduleError::UnknownPhase { .. })
        ));

        let foreign = vec![Phase::new("PHX", "OTHER", day(0), day(1))];
        assert!(matches!(
            ProgressTree::build(&project(), &foreign, &[]),
            Err(ScheduleError::ForeignPhase { .. })
        ));

        let twice = vec![
            Phase::new("PH", "P", day(0), day(10)),
            Phase::new("PH", "P", day(0), day(5)),
        ];
        assert_eq!(
            ProgressTree::build(&project(), &twice, &[]).unwrap_err(),
            ScheduleError::DuplicatePhase { phase: "PH".into() }
        );
    }

    #[test]
    fn test_progress_above_100_rejected_at_every_level() {
        let phases = vec![Phase::new("PH", "P", day(0), day(10))];

        let over = vec![act("A", "PH", 1, 101)];
        assert_eq!(
            ProgressTree::build(&project(), &phases, &over).unwrap_err(),
            ScheduleError::ProgressOutOfRange {
                entity_id: "A".into(),
                progress: 101,
            }
        );

        let phase_over = vec![Phase::new("PH", "P", day(0), day(10)).with_progress(150)];
        assert_eq!(
            ProgressTree::build(&project(), &phase_over, &[]).unwrap_err(),
            ScheduleError::ProgressOutOfRange {
                entity_id: "PH".into(),
                progress: 150,
            }
        );

        let project_over = project().with_progress(200);
        let err = ProgressTree::build(&project_over, &phases, &[]).unwrap_err();
        assert!(matches!(err, ScheduleError::ProgressOutOfRange { progress: 200, .. }));
        assert_eq!(err.class(), crate::error::ErrorClass::UserData);
    }

    #[test]
    fn test_parent_in_other_phase_rejected() {
        let phases = vec![
            Phase::new("PH1", "P", day(0), day(10)),
            Phase::new("PH2", "P", day(0), day(10)),
        ];
        let acts = vec![
            act("A", "PH1", 1, 0),
            act("B", "PH2", 1, 0).with_parent("A"),
        ];
        assert!(matches!(
            ProgressTree::build(&project(), &phases, &acts),
            Err(ScheduleError::InvalidActivity { .. })
        ));
    }
}
