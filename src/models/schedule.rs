//! Schedule (propagation result) model.
//!
//! A schedule holds the earliest and latest start/finish of every activity
//! as whole-day offsets from the scheduling epoch, the precedence links
//! between them, and any soft-invariant violations found along the way.
//!
//! # Reference
//! Kelley & Walker (1959), "Critical-Path Planning and Scheduling"

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{date_at, DependencyKind};

/// Computed dates of one activity (day offsets from the epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySchedule {
    /// Activity code.
    pub code: String,
    /// Owning phase code.
    pub phase: String,
    /// Effective duration in days (may exceed the recorded one for flexible activities).
    pub duration_days: i64,
    /// Earliest start.
    pub earliest_start: i64,
    /// Earliest finish.
    pub earliest_finish: i64,
    /// Latest start.
    pub latest_start: i64,
    /// Latest finish.
    pub latest_finish: i64,
}

impl ActivitySchedule {
    /// Float measured on starts: `latest_start - earliest_start`.
    #[inline]
    pub fn start_float(&self) -> i64 {
        self.latest_start - self.earliest_start
    }

    /// Float measured on finishes: `latest_finish - earliest_finish`.
    #[inline]
    pub fn finish_float(&self) -> i64 {
        self.latest_finish - self.earliest_finish
    }
}

/// A precedence link between two scheduled activities (indices into
/// [`ScheduleResult::activities`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleLink {
    /// Index of the activity depended upon.
    pub predecessor: usize,
    /// Index of the dependent activity.
    pub successor: usize,
    /// Relation kind.
    pub kind: DependencyKind,
}

/// Output of the forward/backward passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleResult {
    /// Day 0 of the schedule.
    pub epoch: NaiveDate,
    /// Per-activity dates, indexed like the graph nodes.
    pub activities: Vec<ActivitySchedule>,
    /// Precedence links.
    pub links: Vec<ScheduleLink>,
    /// Topological order used by the passes.
    pub order: Vec<usize>,
    /// Soft-invariant violations.
    pub violations: Vec<Violation>,
}

impl ScheduleResult {
    /// Converts a day offset to a calendar date.
    #[inline]
    pub fn date(&self, offset: i64) -> NaiveDate {
        date_at(self.epoch, offset)
    }

    /// Finds the schedule of an activity by code.
    pub fn activity(&self, code: &str) -> Option<&ActivitySchedule> {
        self.activities.iter().find(|a| a.code == code)
    }

    /// Earliest completion of the whole schedule (max earliest finish).
    pub fn completion(&self) -> i64 {
        self.activities
            .iter()
            .map(|a| a.earliest_finish)
            .max()
            .unwrap_or(0)
    }

    /// Number of scheduled activities.
    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }
}

/// The bound that limited an activity's dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "bound", rename_all = "snake_case")]
pub enum ScheduleBound {
    /// A phase's end date.
    PhaseEnd { phase: String, date: NaiveDate },
    /// The project's end date.
    ProjectEnd { project: String, date: NaiveDate },
    /// A dependent activity's latest dates.
    Successor {
        activity_id: String,
        kind: DependencyKind,
        date: NaiveDate,
    },
}

impl ScheduleBound {
    /// The date of the bound.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::PhaseEnd { date, .. }
            | Self::ProjectEnd { date, .. }
            | Self::Successor { date, .. } => *date,
        }
    }
}

impl fmt::Display for ScheduleBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhaseEnd { phase, date } => write!(f, "end of phase '{phase}' ({date})"),
            Self::ProjectEnd { project, date } => write!(f, "end of project '{project}' ({date})"),
            Self::Successor {
                activity_id,
                kind,
                date,
            } => write!(f, "{kind} successor '{activity_id}' ({date})"),
        }
    }
}

/// A soft-invariant violation. Reported, never clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity code.
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Classification of soft violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    /// Phase starts before its project.
    PhaseStartsBeforeProject,
    /// Phase ends after its project.
    PhaseEndsAfterProject,
}

impl Violation {
    /// Phase window begins before the project window.
    pub fn phase_starts_before_project(
        phase: impl Into<String>,
        phase_start: NaiveDate,
        project_start: NaiveDate,
    ) -> Self {
        let phase = phase.into();
        Self {
            message: format!(
                "Phase '{phase}' starts {phase_start}, before its project ({project_start})"
            ),
            violation_type: ViolationType::PhaseStartsBeforeProject,
            entity_id: phase,
        }
    }

    /// Phase window ends after the project window.
    pub fn phase_ends_after_project(
        phase: impl Into<String>,
        phase_end: NaiveDate,
        project_end: NaiveDate,
    ) -> Self {
        let phase = phase.into();
        Self {
            message: format!("Phase '{phase}' ends {phase_end}, after its project ({project_end})"),
            violation_type: ViolationType::PhaseEndsAfterProject,
            entity_id: phase,
        }
    }
}
