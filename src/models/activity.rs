//! Activity model.
//!
//! An activity is the smallest schedulable unit of work. It belongs to a
//! phase, may be nested under a parent activity (sub-activities), and is
//! linked to other activities by [`Dependency`](super::Dependency) edges.
//!
//! # Duration Model
//!
//! Duration is `end_date - start_date` in whole days. The recorded dates
//! only supply the duration; the scheduled position comes from propagation.
//! A zero-duration activity is a milestone.
//!
//! A *fixed* activity (the default) keeps its duration: a constraint on its
//! finish moves its start. A *flexible* activity stretches instead: finish
//! constraints lengthen it while its start stays where start constraints
//! put it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DateWindow, Status};

/// An activity to be scheduled. Unique by `(name, phase)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// Unique activity code.
    pub code: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Owning phase code.
    pub phase: String,
    /// Parent activity code, for sub-activities.
    #[serde(default)]
    pub parent: Option<String>,
    /// Recorded start date.
    pub start_date: NaiveDate,
    /// Recorded end date.
    pub end_date: NaiveDate,
    /// Completion percentage (0-100). Authoritative on leaf activities.
    #[serde(default)]
    pub progress: u8,
    /// Lifecycle status.
    #[serde(default)]
    pub status: Status,
    /// Whether finish constraints stretch the duration instead of moving the start.
    #[serde(default)]
    pub flexible: bool,
}

impl Activity {
    /// Creates an activity of `phase` with the recorded dates `[start_date, end_date]`.
    pub fn new(
        code: impl Into<String>,
        phase: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let code = code.into();
        Self {
            name: code.clone(),
            code,
            description: String::new(),
            phase: phase.into(),
            parent: None,
            start_date,
            end_date,
            progress: 0,
            status: Status::default(),
            flexible: false,
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Nests this activity under `parent`.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Sets the progress percentage.
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress;
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Lets finish constraints stretch the duration.
    pub fn flexible(mut self) -> Self {
        self.flexible = true;
        self
    }

    /// Recorded duration in days. Negative when the recorded dates are inverted.
    pub fn duration_days(&self) -> i64 {
        self.window().duration_days()
    }

    /// Whether this is a zero-duration milestone.
    pub fn is_milestone(&self) -> bool {
        self.duration_days() == 0
    }

    /// The recorded date window.
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }
}
