//! Scheduling pipeline and KPI evaluation.
//!
//! `ProjectScheduler` chains graph construction, cycle validation, date
//! propagation, critical path analysis and progress roll-up into one run
//! per project, and fans independent projects out over a thread pool.
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - Moder, Phillips & Davis (1983), "Project Management with CPM, PERT and
//!   Precedence Diagramming"

mod kpi;
mod project;

pub use kpi::{ScheduleKpi, NEAR_CRITICAL_DAYS};
pub use project::{ProjectSchedule, ProjectScheduler, ScheduledActivity};
