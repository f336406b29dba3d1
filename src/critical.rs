//! Float and critical path analysis.
//!
//! Derives per-activity float from a propagated [`ScheduleResult`] and
//! extracts the chains of zero-float activities.
//!
//! # Definitions
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total float | LS − ES (must equal LF − EF) |
//! | Free float | Slack before the earliest dates of any successor move |
//! | Critical | Total float = 0 |
//! | Critical path | Maximal chain of critical activities joined by driving (zero-slack) dependencies |
//!
//! # Reference
//! Moder, Phillips & Davis (1983), "Project Management with CPM, PERT and
//! Precedence Diagramming", Ch. 5

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::DEFAULT_MAX_CRITICAL_PATHS;
use crate::error::{Result, ScheduleError};
use crate::models::{ActivitySchedule, Anchor, ScheduleResult};

/// Float of one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFloat {
    /// Activity code.
    pub code: String,
    /// Total float (days).
    pub total_float: i64,
    /// Free float (days), never above total float.
    pub free_float: i64,
    /// Zero total float.
    pub critical: bool,
}

/// Output of [`analyze_critical_path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalPathAnalysis {
    /// Per-activity float, indexed like [`ScheduleResult::activities`].
    pub per_activity: Vec<ActivityFloat>,
    /// Critical paths, each an ordered sequence of activity codes.
    pub critical_paths: Vec<Vec<String>>,
    /// More critical paths exist than the enumeration limit allowed.
    #[serde(default)]
    pub truncated: bool,
    /// Earliest completion of the schedule (day offset).
    pub completion: i64,
}

impl CriticalPathAnalysis {
    /// Float of an activity by code.
    pub fn activity(&self, code: &str) -> Option<&ActivityFloat> {
        self.per_activity.iter().find(|a| a.code == code)
    }

    /// Whether the activity is critical (`false` if unknown).
    pub fn is_critical(&self, code: &str) -> bool {
        self.activity(code).is_some_and(|a| a.critical)
    }

    /// Codes of all critical activities.
    pub fn critical_codes(&self) -> Vec<&str> {
        self.per_activity
            .iter()
            .filter(|a| a.critical)
            .map(|a| a.code.as_str())
            .collect()
    }

    /// Number of critical activities.
    pub fn critical_count(&self) -> usize {
        self.per_activity.iter().filter(|a| a.critical).count()
    }
}

fn earliest(schedule: &ActivitySchedule, anchor: Anchor) -> i64 {
    match anchor {
        Anchor::Start => schedule.earliest_start,
        Anchor::Finish => schedule.earliest_finish,
    }
}

/// Computes float per activity and the critical paths, enumerating at most
/// [`DEFAULT_MAX_CRITICAL_PATHS`] paths.
///
/// See [`analyze_critical_path_with_limit`].
pub fn analyze_critical_path(result: &ScheduleResult) -> Result<CriticalPathAnalysis> {
    analyze_critical_path_with_limit(result, DEFAULT_MAX_CRITICAL_PATHS)
}

/// Computes float per activity and up to `max_paths` critical paths.
///
/// A link is critical when both endpoints are critical and the link itself
/// is driving (zero slack between the anchored earliest dates). Paths start
/// at critical activities with no incoming critical link (visited in the
/// schedule's topological order) and branch in ascending successor code. A
/// critical activity with no critical links forms a path on its own.
///
/// Parallel equal-length branches multiply the number of paths, so the
/// enumeration stops after `max_paths` and sets
/// [`CriticalPathAnalysis::truncated`].
///
/// # Errors
/// [`ScheduleError::InconsistentFloat`] if start float and finish float
/// disagree for any activity. This indicates a propagation defect.
pub fn analyze_critical_path_with_limit(
    result: &ScheduleResult,
    max_paths: usize,
) -> Result<CriticalPathAnalysis> {
    let acts = &result.activities;
    let n = acts.len();

    let slacks: Vec<i64> = result
        .links
        .iter()
        .map(|link| {
            let (pred_anchor, succ_anchor) = link.kind.anchors();
            earliest(&acts[link.successor], succ_anchor)
                - earliest(&acts[link.predecessor], pred_anchor)
        })
        .collect();

    let mut free: Vec<Option<i64>> = vec![None; n];
    for (link, &slack) in result.links.iter().zip(&slacks) {
        let slot = &mut free[link.predecessor];
        *slot = Some(slot.map_or(slack, |f| f.min(slack)));
    }

    let mut per_activity = Vec::with_capacity(n);
    for (i, a) in acts.iter().enumerate() {
        let start_float = a.start_float();
        let finish_float = a.finish_float();
        if start_float != finish_float {
            error!(
                activity = %a.code,
                start_float,
                finish_float,
                "float mismatch after propagation"
            );
            return Err(ScheduleError::InconsistentFloat {
                activity_id: a.code.clone(),
                start_float,
                finish_float,
            });
        }
        let total_float = start_float;
        per_activity.push(ActivityFloat {
            code: a.code.clone(),
            total_float,
            free_float: free[i].map_or(total_float, |f| f.min(total_float)),
            critical: total_float == 0,
        });
    }

    let critical: Vec<bool> = per_activity.iter().map(|a| a.critical).collect();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut has_critical_pred = vec![false; n];
    for (link, &slack) in result.links.iter().zip(&slacks) {
        if slack == 0 && critical[link.predecessor] && critical[link.successor] {
            successors[link.predecessor].push(link.successor);
            has_critical_pred[link.successor] = true;
        }
    }
    for list in &mut successors {
        list.sort_by(|&a, &b| acts[a].code.cmp(&acts[b].code));
        list.dedup();
    }

    let mut critical_paths = Vec::new();
    let mut truncated = false;
    'sources: for &source in &result.order {
        if !critical[source] || has_critical_pred[source] {
            continue;
        }
        // Explicit-stack enumeration of every source-to-sink chain.
        let mut path = vec![source];
        let mut cursors = vec![0usize];
        while let Some(&current) = path.last() {
            let depth = path.len() - 1;
            match successors[current].get(cursors[depth]).copied() {
                Some(next) => {
                    cursors[depth] += 1;
                    path.push(next);
                    cursors.push(0);
                }
                None => {
                    if successors[current].is_empty() {
                        if critical_paths.len() == max_paths {
                            truncated = true;
                            break 'sources;
                        }
                        critical_paths.push(path.iter().map(|&i| acts[i].code.clone()).collect());
                    }
                    path.pop();
                    cursors.pop();
                }
            }
        }
    }

    if truncated {
        warn!(limit = max_paths, "critical path enumeration truncated");
    }
    debug!(
        critical = critical.iter().filter(|&&c| c).count(),
        paths = critical_paths.len(),
        "critical path analysis complete"
    );

    Ok(CriticalPathAnalysis {
        per_activity,
        critical_paths,
        truncated,
        completion: result.completion(),
    })
}
