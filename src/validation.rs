//! Input validation for scheduling runs.
//!
//! Two layers:
//! - [`validate_acyclic`]: the dependency graph must be a DAG. Produces the
//!   topological order every propagation pass runs on.
//! - [`validate_snapshot`]: record-level integrity checks on a whole
//!   [`ProjectSnapshot`], collecting every problem instead of stopping at
//!   the first one.
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{Result, ScheduleError};
use crate::graph::{ActivityGraph, NodeIndex};
use crate::models::ProjectSnapshot;

/// A topological order of an [`ActivityGraph`]: every edge's predecessor
/// comes before its successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopoOrder(Vec<NodeIndex>);

impl TopoOrder {
    /// Node indices in order.
    pub fn as_slice(&self) -> &[NodeIndex] {
        &self.0
    }

    /// Iterates node indices in order.
    pub fn iter(&self) -> std::slice::Iter<'_, NodeIndex> {
        self.0.iter()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the order is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Activity codes in order.
    pub fn codes<'g>(&self, graph: &'g ActivityGraph) -> Vec<&'g str> {
        self.0.iter().map(|&n| graph.node(n).code.as_str()).collect()
    }

    /// `position[node]` = rank of `node` in the order.
    pub fn positions(&self) -> Vec<usize> {
        let mut position = vec![0; self.0.len()];
        for (rank, &node) in self.0.iter().enumerate() {
            position[node] = rank;
        }
        position
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Verifies the dependency graph is acyclic and returns a topological order.
///
/// # Algorithm
/// Depth-first search over *predecessor* edges with an explicit stack. A
/// node is emitted once everything it depends on has been emitted, so the
/// post-order is already a topological order. Roots are taken in ascending
/// activity code and predecessors are explored in ascending code, which
/// makes the result deterministic.
///
/// Reaching a node that is still `Visiting` closes a cycle; the stack
/// segment above it is the cycle.
///
/// # Errors
/// [`ScheduleError::CyclicDependency`] with the cycle in dependency-flow
/// order (each activity is depended on by the next, the last by the first),
/// rotated to start at the smallest code.
pub fn validate_acyclic(graph: &ActivityGraph) -> Result<TopoOrder> {
    let n = graph.node_count();
    let mut marks = vec![Mark::Unvisited; n];
    let mut order = Vec::with_capacity(n);

    let mut roots: Vec<NodeIndex> = (0..n).collect();
    roots.sort_by(|&a, &b| graph.node(a).code.cmp(&graph.node(b).code));

    // (node, number of incoming edges already explored)
    let mut stack: Vec<(NodeIndex, usize)> = Vec::new();

    for root in roots {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::Visiting;
        stack.push((root, 0));

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            match graph.incoming_edge(node, top.1) {
                Some(edge) => {
                    top.1 += 1;
                    let pred = edge.predecessor;
                    match marks[pred] {
                        Mark::Unvisited => {
                            marks[pred] = Mark::Visiting;
                            stack.push((pred, 0));
                        }
                        Mark::Visiting => return Err(cycle_error(graph, &stack, pred)),
                        Mark::Done => {}
                    }
                }
                None => {
                    marks[node] = Mark::Done;
                    order.push(node);
                    stack.pop();
                }
            }
        }
    }

    debug!(nodes = order.len(), "dependency graph is acyclic");
    Ok(TopoOrder(order))
}

fn cycle_error(graph: &ActivityGraph, stack: &[(NodeIndex, usize)], entry: NodeIndex) -> ScheduleError {
    let start = stack
        .iter()
        .position(|&(node, _)| node == entry)
        .unwrap_or(0);
    // Each stack entry depends on the one above it, so reversing yields flow order.
    let mut cycle: Vec<String> = stack[start..]
        .iter()
        .rev()
        .map(|&(node, _)| graph.node(node).code.clone())
        .collect();
    if let Some(min_pos) = cycle
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map(|(i, _)| i)
    {
        cycle.rotate_left(min_pos);
    }
    ScheduleError::CyclicDependency { cycle }
}

/// Result of record-level validation.
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// A record-level validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two records share the same code.
    DuplicateId,
    /// Two siblings share the same name.
    DuplicateName,
    /// A phase names a different project.
    ForeignPhase,
    /// An activity references a phase that doesn't exist.
    InvalidPhaseReference,
    /// An activity references a parent that doesn't exist.
    InvalidParentReference,
    /// A sub-activity sits in a different phase than its parent.
    ParentPhaseMismatch,
    /// A dependency references an activity that doesn't exist.
    InvalidActivityReference,
    /// The same (activity, depends_on, kind) triple appears twice.
    DuplicateDependency,
    /// End date precedes start date.
    InvalidDateRange,
    /// Progress outside 0..=100.
    ProgressOutOfRange,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a snapshot's records.
///
/// Checks:
/// 1. No duplicate phase or activity codes
/// 2. Phase names unique within the project, activity names unique within a phase
///    (unnamed records are exempt)
/// 3. Every phase belongs to the snapshot's project
/// 4. Every activity references an existing phase, and an existing parent in
///    the same phase
/// 5. Every dependency endpoint exists and no triple repeats
/// 6. No record ends before it starts
/// 7. All progress values within 0..=100
///
/// Graph-level properties (acyclic dependencies and hierarchy) are checked
/// by the pipeline itself.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_snapshot(snapshot: &ProjectSnapshot) -> ValidationResult {
    let mut errors = Vec::new();
    let project = &snapshot.project;

    if project.window().is_inverted() {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidDateRange,
            format!("Project '{}' ends before it starts", project.code),
        ));
    }
    if project.progress > 100 {
        errors.push(ValidationError::new(
            ValidationErrorKind::ProgressOutOfRange,
            format!("Project '{}' progress {} > 100", project.code, project.progress),
        ));
    }

    // Phases
    let mut phase_codes = HashSet::new();
    let mut phase_names = HashSet::new();
    for phase in &snapshot.phases {
        if !phase_codes.insert(phase.code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate phase code: {}", phase.code),
            ));
        }
        if !phase.name.is_empty() && !phase_names.insert(phase.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!(
                    "Duplicate phase name '{}' in project '{}'",
                    phase.name, project.code
                ),
            ));
        }
        if phase.project != project.code {
            errors.push(ValidationError::new(
                ValidationErrorKind::ForeignPhase,
                format!(
                    "Phase '{}' belongs to project '{}', not '{}'",
                    phase.code, phase.project, project.code
                ),
            ));
        }
        if phase.window().is_inverted() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDateRange,
                format!("Phase '{}' ends before it starts", phase.code),
            ));
        }
        if phase.progress > 100 {
            errors.push(ValidationError::new(
                ValidationErrorKind::ProgressOutOfRange,
                format!("Phase '{}' progress {} > 100", phase.code, phase.progress),
            ));
        }
    }

    // Activities
    let mut activity_phase: HashMap<&str, &str> = HashMap::new();
    let mut activity_names = HashSet::new();
    for act in &snapshot.activities {
        if activity_phase
            .insert(act.code.as_str(), act.phase.as_str())
            .is_some()
        {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate activity code: {}", act.code),
            ));
        }
        if !act.name.is_empty() && !activity_names.insert((act.phase.as_str(), act.name.as_str())) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!(
                    "Duplicate activity name '{}' in phase '{}'",
                    act.name, act.phase
                ),
            ));
        }
        if !phase_codes.contains(act.phase.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPhaseReference,
                format!(
                    "Activity '{}' references unknown phase '{}'",
                    act.code, act.phase
                ),
            ));
        }
        if act.window().is_inverted() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDateRange,
                format!("Activity '{}' ends before it starts", act.code),
            ));
        }
        if act.progress > 100 {
            errors.push(ValidationError::new(
                ValidationErrorKind::ProgressOutOfRange,
                format!("Activity '{}' progress {} > 100", act.code, act.progress),
            ));
        }
    }

    // Parent references (needs the full activity map)
    for act in &snapshot.activities {
        let Some(parent) = act.parent.as_deref() else {
            continue;
        };
        match activity_phase.get(parent) {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::InvalidParentReference,
                format!(
                    "Activity '{}' references unknown parent '{}'",
                    act.code, parent
                ),
            )),
            Some(&parent_phase) if parent_phase != act.phase => {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ParentPhaseMismatch,
                    format!(
                        "Activity '{}' is in phase '{}' but its parent '{}' is in '{}'",
                        act.code, act.phase, parent, parent_phase
                    ),
                ))
            }
            Some(_) => {}
        }
    }

    // Dependencies
    let mut triples = HashSet::new();
    for dep in &snapshot.dependencies {
        for endpoint in [&dep.activity, &dep.depends_on] {
            if !activity_phase.contains_key(endpoint.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidActivityReference,
                    format!(
                        "Dependency {} -> {} references unknown activity '{}'",
                        dep.activity, dep.depends_on, endpoint
                    ),
                ));
            }
        }
        if !triples.insert((dep.activity.as_str(), dep.depends_on.as_str(), dep.kind)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateDependency,
                format!(
                    "Duplicate dependency {} -> {} ({})",
                    dep.activity, dep.depends_on, dep.kind
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
