//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// Default cap on activities per scheduling run.
pub const DEFAULT_MAX_ACTIVITIES: usize = 10_000;

/// Default cap on critical paths enumerated per run.
pub const DEFAULT_MAX_CRITICAL_PATHS: usize = 1_000;

/// Tunables for [`ProjectScheduler`](crate::scheduler::ProjectScheduler).
///
/// Every field has a default, so a partial (or empty) JSON object is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Largest snapshot accepted, in activities.
    pub max_activities: usize,
    /// Most critical paths listed; further paths are dropped and flagged.
    pub max_critical_paths: usize,
    /// Weight given to zero-duration entities in progress means.
    pub min_progress_weight: i64,
    /// Run record-level validation before scheduling.
    pub validate_records: bool,
}

impl SchedulerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the activity cap.
    pub fn with_max_activities(mut self, max_activities: usize) -> Self {
        self.max_activities = max_activities;
        self
    }

    /// Sets the critical path enumeration limit.
    pub fn with_max_critical_paths(mut self, max_critical_paths: usize) -> Self {
        self.max_critical_paths = max_critical_paths;
        self
    }

    /// Sets the minimum progress weight (values below 1 are raised to 1).
    pub fn with_min_progress_weight(mut self, weight: i64) -> Self {
        self.min_progress_weight = weight.max(1);
        self
    }

    /// Enables or disables record-level validation.
    pub fn with_record_validation(mut self, enabled: bool) -> Self {
        self.validate_records = enabled;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_activities: DEFAULT_MAX_ACTIVITIES,
            max_critical_paths: DEFAULT_MAX_CRITICAL_PATHS,
            min_progress_weight: 1,
            validate_records: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = SchedulerConfig::new();
        assert_eq!(c.max_activities, 10_000);
        assert_eq!(c.max_critical_paths, 1_000);
        assert_eq!(c.min_progress_weight, 1);
        assert!(c.validate_records);
    }

    #[test]
    fn test_partial_json() {
        let c: SchedulerConfig = serde_json::from_str(r#"{"max_activities": 500}"#).unwrap();
        assert_eq!(c.max_activities, 500);
        assert_eq!(c.min_progress_weight, 1);

        let empty: SchedulerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SchedulerConfig::default());
    }

    #[test]
    fn test_builder() {
        let c = SchedulerConfig::new()
            .with_max_activities(3)
            .with_max_critical_paths(5)
            .with_min_progress_weight(0)
            .with_record_validation(false);
        assert_eq!(c.max_activities, 3);
        assert_eq!(c.max_critical_paths, 5);
        assert_eq!(c.min_progress_weight, 1);
        assert!(!c.validate_records);
    }
}
