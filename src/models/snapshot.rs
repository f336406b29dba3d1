use serde::{Deserialize, Serialize};

use super::{Activity, Dependency, Phase, Project};

/// Everything one scheduling run reads: a project and the phases,
/// activities and dependencies in its scope.
///
/// Supplied by the records layer, typically as JSON inside the transaction
/// that will persist the results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// The project being scheduled.
    pub project: Project,
    /// Phases of the project.
    #[serde(default)]
    pub phases: Vec<Phase>,
    /// Activities of those phases, sub-activities included.
    #[serde(default)]
    pub activities: Vec<Activity>,
    /// Dependencies between those activities.
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl ProjectSnapshot {
    /// Creates a snapshot with no phases.
    pub fn new(project: Project) -> Self {
        Self {
            project,
            phases: Vec::new(),
            activities: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// Adds a phase.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    /// Adds an activity.
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }

    /// Adds a dependency.
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Number of activities in scope.
    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DependencyKind;

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "project": {"code": "P", "start_date": "2024-01-01", "end_date": "2024-02-01"},
            "phases": [
                {"code": "PH", "project": "P", "start_date": "2024-01-01", "end_date": "2024-01-21"}
            ],
            "activities": [
                {"code": "A", "phase": "PH", "start_date": "2024-01-01", "end_date": "2024-01-06"},
                {"code": "B", "phase": "PH", "start_date": "2024-01-06", "end_date": "2024-01-11",
                 "progress": 50, "status": "in_progress"}
            ],
            "dependencies": [
                {"activity": "B", "depends_on": "A", "dependency_type": "finish_to_start"}
            ]
        }"#;
        let snap: ProjectSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.project.code, "P");
        assert_eq!(snap.phases.len(), 1);
        assert_eq!(snap.activity_count(), 2);
        assert_eq!(snap.activities[1].progress, 50);
        assert_eq!(snap.dependencies[0].kind, DependencyKind::FinishToStart);
    }

    #[test]
    fn test_snapshot_missing_collections_default_empty() {
        let json = r#"{"project": {"code": "P", "start_date": "2024-01-01", "end_date": "2024-02-01"}}"#;
        let snap: ProjectSnapshot = serde_json::from_str(json).unwrap();
        assert!(snap.phases.is_empty());
        assert!(snap.dependencies.is_empty());
    }
}
