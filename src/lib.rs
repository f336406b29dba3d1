//! Project scheduling engine.
//!
//! Computes earliest/latest dates, float and critical paths for the
//! activities of a project plan, and rolls activity progress up to phases
//! and the project.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Project`, `Phase`, `Activity`, `Dependency`,
//!   `ProjectSnapshot`, `ScheduleResult`
//! - **`graph`**: Dependency graph construction (`build_graph`)
//! - **`validation`**: Cycle detection with topological order (`validate_acyclic`)
//!   and record integrity checks (`validate_snapshot`)
//! - **`propagation`**: Forward/backward date propagation under FS/SS/FF/SF
//!   dependencies and phase/project windows (`propagate`)
//! - **`critical`**: Total/free float and critical paths (`analyze_critical_path`)
//! - **`progress`**: Duration-weighted progress roll-up (`aggregate_progress`)
//! - **`scheduler`**: The end-to-end pipeline (`ProjectScheduler`) and KPIs
//! - **`config`**: Scheduler limits and tunables
//! - **`error`**: `ScheduleError` and its classification
//!
//! # Time model
//!
//! Dates are whole calendar days. Internally every date is an offset in
//! days from the project start; an activity occupies `[start, finish)`.
//!
//! # References
//!
//! - Kelley & Walker (1959), "Critical-Path Planning and Scheduling"
//! - Moder, Phillips & Davis (1983), "Project Management with CPM, PERT and
//!   Precedence Diagramming"

pub mod config;
pub mod critical;
pub mod error;
pub mod graph;
pub mod models;
pub mod progress;
pub mod propagation;
pub mod scheduler;
pub mod validation;

pub use config::SchedulerConfig;
pub use critical::{
    analyze_critical_path, analyze_critical_path_with_limit, ActivityFloat, CriticalPathAnalysis,
};
pub use error::{ErrorClass, Result, ScheduleError};
pub use graph::{build_graph, ActivityGraph};
pub use progress::{aggregate_progress, ProgressRollup, ProgressTree};
pub use propagation::{propagate, ScheduleBounds};
pub use scheduler::{ProjectSchedule, ProjectScheduler, ScheduleKpi, ScheduledActivity};
pub use validation::{validate_acyclic, validate_snapshot, TopoOrder};
