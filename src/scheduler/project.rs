//! Project scheduling pipeline.
//!
//! # Algorithm
//!
//! 1. Enforce the activity cap and (optionally) record-level validation.
//! 2. Build the dependency graph and verify it is acyclic.
//! 3. Propagate earliest/latest dates within the phase and project bounds.
//! 4. Derive float and critical paths.
//! 5. Roll up progress.
//!
//! Each run is a pure function of one [`ProjectSnapshot`]. Runs for
//! different projects share nothing and may execute in parallel; runs for
//! the same project must be serialized by the caller.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span};

use crate::config::SchedulerConfig;
use crate::critical::analyze_critical_path_with_limit;
use crate::error::{Result, ScheduleError};
use crate::graph::build_graph;
use crate::models::{ProjectSnapshot, Violation};
use crate::progress::{aggregate_progress, ProgressRollup, ProgressTree};
use crate::propagation::{propagate, ScheduleBounds};
use crate::validation::{validate_acyclic, validate_snapshot};

use super::ScheduleKpi;

/// Derived fields of one activity, ready to be written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledActivity {
    /// Activity code.
    pub code: String,
    /// Owning phase code.
    pub phase: String,
    /// Effective duration (days).
    pub duration_days: i64,
    /// Earliest start date.
    pub earliest_start: NaiveDate,
    /// Earliest finish date.
    pub earliest_finish: NaiveDate,
    /// Latest start date.
    pub latest_start: NaiveDate,
    /// Latest finish date.
    pub latest_finish: NaiveDate,
    /// Total float (days).
    pub total_float: i64,
    /// Free float (days).
    pub free_float: i64,
    /// On a critical path.
    pub critical: bool,
}

/// Everything a scheduling run writes back for one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSchedule {
    /// Project code.
    pub project: String,
    /// Per-activity results, in snapshot order.
    pub activities: Vec<ScheduledActivity>,
    /// Critical paths as ordered activity codes.
    pub critical_paths: Vec<Vec<String>>,
    /// `critical_paths` was cut short by the configured limit.
    pub critical_paths_truncated: bool,
    /// Rolled-up progress.
    pub progress: ProgressRollup,
    /// Soft-invariant violations.
    pub violations: Vec<Violation>,
    /// Summary metrics.
    pub kpi: ScheduleKpi,
}

impl ProjectSchedule {
    /// Finds an activity's result by code.
    pub fn activity(&self, code: &str) -> Option<&ScheduledActivity> {
        self.activities.iter().find(|a| a.code == code)
    }
}

/// Runs the full scheduling pipeline over project snapshots.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use u_project::models::{Activity, Dependency, Phase, Project, ProjectSnapshot};
/// use u_project::scheduler::ProjectScheduler;
///
/// let d = |n| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::TimeDelta::days(n);
/// let snapshot = ProjectSnapshot::new(Project::new("P", d(0), d(30)))
///     .with_phase(Phase::new("PH", "P", d(0), d(10)))
///     .with_activity(Activity::new("A", "PH", d(0), d(5)))
///     .with_activity(Activity::new("B", "PH", d(0), d(5)))
///     .with_dependency(Dependency::finish_to_start("B", "A"));
///
/// let schedule = ProjectScheduler::default().schedule(&snapshot).unwrap();
/// assert_eq!(schedule.critical_paths, vec![vec!["A".to_string(), "B".to_string()]]);
/// assert_eq!(schedule.activity("B").unwrap().earliest_start, d(5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProjectScheduler {
    config: SchedulerConfig,
}

impl ProjectScheduler {
    /// Creates a scheduler with the given configuration.
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Schedules one project.
    ///
    /// Either returns a complete schedule or an error; nothing partial.
    pub fn schedule(&self, snapshot: &ProjectSnapshot) -> Result<ProjectSchedule> {
        let project = &snapshot.project;
        let _span = info_span!("schedule_project", project = %project.code).entered();

        let count = snapshot.activity_count();
        if count > self.config.max_activities {
            return Err(ScheduleError::TooManyActivities {
                count,
                limit: self.config.max_activities,
            });
        }
        if self.config.validate_records {
            validate_snapshot(snapshot).map_err(|errors| {
                debug!(errors = errors.len(), "snapshot rejected");
                ScheduleError::InvalidSnapshot { errors }
            })?;
        }

        let graph = build_graph(&snapshot.activities, &snapshot.dependencies)?;
        let order = validate_acyclic(&graph)?;
        let bounds = ScheduleBounds::from_records(project, &snapshot.phases);
        let result = propagate(&order, &graph, &bounds)?;
        let analysis = analyze_critical_path_with_limit(&result, self.config.max_critical_paths)?;

        let tree = ProgressTree::build(project, &snapshot.phases, &snapshot.activities)?
            .with_min_weight(self.config.min_progress_weight);
        let progress = aggregate_progress(&tree);

        let kpi = ScheduleKpi::calculate(&result, &analysis, project.end_date);

        let activities = result
            .activities
            .iter()
            .zip(&analysis.per_activity)
            .map(|(dates, float)| ScheduledActivity {
                code: dates.code.clone(),
                phase: dates.phase.clone(),
                duration_days: dates.duration_days,
                earliest_start: result.date(dates.earliest_start),
                earliest_finish: result.date(dates.earliest_finish),
                latest_start: result.date(dates.latest_start),
                latest_finish: result.date(dates.latest_finish),
                total_float: float.total_float,
                free_float: float.free_float,
                critical: float.critical,
            })
            .collect();

        info!(
            activities = kpi.activity_count,
            critical = kpi.critical_count,
            completion = %kpi.completion_date,
            progress = progress.project,
            "project scheduled"
        );

        Ok(ProjectSchedule {
            project: project.code.clone(),
            activities,
            critical_paths: analysis.critical_paths,
            critical_paths_truncated: analysis.truncated,
            progress,
            violations: result.violations,
            kpi,
        })
    }

    /// Schedules independent projects in parallel.
    ///
    /// Results come back in input order, one per snapshot.
    pub fn schedule_all(&self, snapshots: &[ProjectSnapshot]) -> Vec<Result<ProjectSchedule>> {
        snapshots.par_iter().map(|s| self.schedule(s)).collect()
    }
}
