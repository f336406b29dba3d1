//! Project scheduling domain models.
//!
//! Provides the record types supplied by the records layer and the
//! schedule types produced by propagation.
//!
//! # Hierarchy
//!
//! | Level | Owns | Bounded by |
//! |-------|------|-----------|
//! | Project | Phases | its own dates |
//! | Phase | Activities | its dates ∩ project dates |
//! | Activity | Sub-activities | phase window |
//!
//! Dependencies form a separate directed graph over activities.

mod activity;
mod dependency;
mod project;
mod schedule;
mod snapshot;
mod status;
mod window;

pub use activity::Activity;
pub use dependency::{Anchor, Dependency, DependencyKind};
pub use project::{Phase, Project};
pub use schedule::{
    ActivitySchedule, ScheduleBound, ScheduleLink, ScheduleResult, Violation, ViolationType,
};
pub use snapshot::ProjectSnapshot;
pub use status::Status;
pub use window::{date_at, days_between, DateWindow};
