use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by projects, phases and activities.
///
/// Serialized in snake_case, matching the values stored by the records
/// layer (`"planning"`, `"in_progress"`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Not started yet.
    #[default]
    Planning,
    /// Work under way.
    InProgress,
    /// Finished.
    Completed,
    /// Paused.
    OnHold,
    /// Abandoned.
    Cancelled,
}

impl Status {
    /// Stable string form, identical to the serialized value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::OnHold => "on_hold",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
