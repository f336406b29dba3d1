//! Project and phase records.
//!
//! A project owns an ordered set of phases; each phase owns activities.
//! Both carry a date window that bounds everything scheduled inside them,
//! and a progress percentage that becomes derived once children exist.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DateWindow, Status};

/// A project: the root of one scheduling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique project code.
    pub code: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Planned start. Also the scheduling epoch (day 0).
    pub start_date: NaiveDate,
    /// Planned end. Upper bound for every activity.
    pub end_date: NaiveDate,
    /// Completion percentage (0-100). Derived once phases exist.
    #[serde(default)]
    pub progress: u8,
    /// Lifecycle status.
    #[serde(default)]
    pub status: Status,
}

impl Project {
    /// Creates a project spanning `[start_date, end_date]`.
    pub fn new(code: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            description: String::new(),
            start_date,
            end_date,
            progress: 0,
            status: Status::default(),
        }
    }

    /// Sets the project name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the stored progress (used only while the project has no phases).
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress;
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// The project's date window.
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }
}

/// A phase of a project. Unique by `(name, project)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    /// Unique phase code.
    pub code: String,
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Owning project code.
    pub project: String,
    /// Earliest day any activity of this phase may start.
    pub start_date: NaiveDate,
    /// Latest day any activity of this phase may finish.
    pub end_date: NaiveDate,
    /// Completion percentage (0-100). Derived once activities exist.
    #[serde(default)]
    pub progress: u8,
    /// Lifecycle status.
    #[serde(default)]
    pub status: Status,
}

impl Phase {
    /// Creates a phase of `project` spanning `[start_date, end_date]`.
    pub fn new(
        code: impl Into<String>,
        project: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let code = code.into();
        Self {
            name: code.clone(),
            code,
            description: String::new(),
            project: project.into(),
            start_date,
            end_date,
            progress: 0,
            status: Status::default(),
        }
    }

    /// Sets the phase name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the stored progress (used only while the phase has no activities).
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress;
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// The phase's date window.
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }
}
