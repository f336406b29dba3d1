//! Scheduling errors.
//!
//! Every failure aborts the whole run: either a complete, internally
//! consistent schedule is produced or nothing is. None of these errors is
//! transient, so none is retryable; the records must be corrected first.

use thiserror::Error;

use crate::models::ScheduleBound;
use crate::validation::ValidationError;

/// Who has to act on an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed input from the caller (bad references, duplicate codes).
    CallerBug,
    /// Valid input describing an impossible plan; surfaced to the end user.
    UserData,
    /// Input outside the engine's operating limits.
    Precondition,
    /// A logic fault in the engine itself.
    Internal,
}

/// Errors raised by the scheduling pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("activity '{referenced_by}' references unknown activity '{activity_id}'")]
    UnknownActivityReference {
        activity_id: String,
        referenced_by: String,
    },

    #[error("duplicate activity code '{activity_id}'")]
    DuplicateActivity { activity_id: String },

    #[error("duplicate phase code '{phase}'")]
    DuplicatePhase { phase: String },

    #[error("'{entity_id}' has progress {progress}, above 100")]
    ProgressOutOfRange { entity_id: String, progress: u8 },

    #[error("activity '{activity_id}' is invalid: {reason}")]
    InvalidActivity { activity_id: String, reason: String },

    #[error("'{referenced_by}' references unknown phase '{phase}'")]
    UnknownPhase { phase: String, referenced_by: String },

    #[error("phase '{phase}' belongs to project '{owner}', not '{project}'")]
    ForeignPhase {
        phase: String,
        owner: String,
        project: String,
    },

    #[error("snapshot failed validation with {} error(s)", .errors.len())]
    InvalidSnapshot { errors: Vec<ValidationError> },

    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("cyclic activity hierarchy: {}", .cycle.join(" -> "))]
    HierarchyCycle { cycle: Vec<String> },

    #[error("activity '{activity_id}' cannot be scheduled within {bound}")]
    InfeasibleSchedule {
        activity_id: String,
        bound: ScheduleBound,
    },

    #[error(
        "activity '{activity_id}' has start float {start_float} but finish float {finish_float}"
    )]
    InconsistentFloat {
        activity_id: String,
        start_float: i64,
        finish_float: i64,
    },

    #[error("{count} activities exceed the limit of {limit}")]
    TooManyActivities { count: usize, limit: usize },
}

impl ScheduleError {
    /// Classifies the error by who has to act on it.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownActivityReference { .. }
            | Self::DuplicateActivity { .. }
            | Self::DuplicatePhase { .. }
            | Self::UnknownPhase { .. }
            | Self::ForeignPhase { .. }
            | Self::InvalidSnapshot { .. } => ErrorClass::CallerBug,
            Self::InvalidActivity { .. }
            | Self::ProgressOutOfRange { .. }
            | Self::CyclicDependency { .. }
            | Self::HierarchyCycle { .. }
            | Self::InfeasibleSchedule { .. } => ErrorClass::UserData,
            Self::TooManyActivities { .. } => ErrorClass::Precondition,
            Self::InconsistentFloat { .. } => ErrorClass::Internal,
        }
    }

    /// Whether the error indicates a defect in the engine rather than in the data.
    pub fn is_internal(&self) -> bool {
        self.class() == ErrorClass::Internal
    }
}

pub type Result<T, E = ScheduleError> = std::result::Result<T, E>;
