//! Schedule quality metrics (KPIs).
//!
//! Summarizes a propagated schedule and its float analysis.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Duration | Earliest completion offset (days from project start) |
//! | Deadline slack | Project end − earliest completion |
//! | Critical ratio | Critical activities / all activities |
//! | Avg / Max float | Mean and largest total float |
//! | Near-critical | Activities with 0 < float ≤ threshold |

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::critical::CriticalPathAnalysis;
use crate::models::ScheduleResult;

/// Float threshold (days) below which a non-critical activity counts as near-critical.
pub const NEAR_CRITICAL_DAYS: i64 = 2;

/// Schedule performance indicators. Time values are in days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Number of scheduled activities.
    pub activity_count: usize,
    /// Days from project start to earliest completion.
    pub duration_days: i64,
    /// Earliest completion date.
    pub completion_date: NaiveDate,
    /// Days between earliest completion and the project end.
    pub deadline_slack_days: i64,
    /// Number of critical activities.
    pub critical_count: usize,
    /// Fraction of activities that are critical (0.0..1.0).
    pub critical_ratio: f64,
    /// Number of activities with small positive float.
    pub near_critical_count: usize,
    /// Mean total float.
    pub avg_float_days: f64,
    /// Largest total float.
    pub max_float_days: i64,
}

impl ScheduleKpi {
    /// Computes KPIs.
    ///
    /// # Arguments
    /// * `result` - The propagated schedule.
    /// * `analysis` - Its float analysis.
    /// * `project_end` - The project's end date.
    pub fn calculate(
        result: &ScheduleResult,
        analysis: &CriticalPathAnalysis,
        project_end: NaiveDate,
    ) -> Self {
        let count = analysis.per_activity.len();
        let critical_count = analysis.critical_count();
        let near_critical_count = analysis
            .per_activity
            .iter()
            .filter(|a| a.total_float > 0 && a.total_float <= NEAR_CRITICAL_DAYS)
            .count();

        let float_sum: i64 = analysis.per_activity.iter().map(|a| a.total_float).sum();
        let max_float_days = analysis
            .per_activity
            .iter()
            .map(|a| a.total_float)
            .max()
            .unwrap_or(0);

        let (critical_ratio, avg_float_days) = if count == 0 {
            (0.0, 0.0)
        } else {
            (
                critical_count as f64 / count as f64,
                float_sum as f64 / count as f64,
            )
        };

        let completion_date = result.date(analysis.completion);
        Self {
            activity_count: count,
            duration_days: analysis.completion,
            completion_date,
            deadline_slack_days: (project_end - completion_date).num_days(),
            critical_count,
            critical_ratio,
            near_critical_count,
            avg_float_days,
            max_float_days,
        }
    }
}
