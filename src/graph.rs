//! Dependency graph construction.
//!
//! Converts activity and dependency records into an arena-indexed directed
//! graph. Nodes are addressed by their position in the input slice; edges
//! point from the activity depended upon (predecessor) to the dependent
//! activity (successor).
//!
//! Design:
//! - `outgoing[n]`: edges whose predecessor is `n`, sorted by successor code
//! - `incoming[n]`: edges whose successor is `n`, sorted by predecessor code
//! - Invariant: every edge index appears exactly once in each of the two lists

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{Result, ScheduleError};
use crate::models::{Activity, Dependency, DependencyKind};

/// Index of a node in an [`ActivityGraph`].
pub type NodeIndex = usize;

/// An activity as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityNode {
    /// Activity code.
    pub code: String,
    /// Owning phase code.
    pub phase: String,
    /// Recorded duration (days).
    pub duration_days: i64,
    /// Whether finish constraints stretch the duration.
    pub flexible: bool,
}

/// A precedence edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Node depended upon.
    pub predecessor: NodeIndex,
    /// Dependent node.
    pub successor: NodeIndex,
    /// Relation kind.
    pub kind: DependencyKind,
}

/// Arena-indexed dependency graph.
#[derive(Debug, Clone, Default)]
pub struct ActivityGraph {
    nodes: Vec<ActivityNode>,
    edges: Vec<DependencyEdge>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
    index: HashMap<String, NodeIndex>,
}

impl ActivityGraph {
    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of (deduplicated) edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node at `index`.
    ///
    /// # Panics
    /// If `index` is out of range.
    pub fn node(&self, index: NodeIndex) -> &ActivityNode {
        &self.nodes[index]
    }

    /// All nodes, in input order.
    pub fn nodes(&self) -> &[ActivityNode] {
        &self.nodes
    }

    /// All edges.
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Looks up a node by activity code.
    pub fn index_of(&self, code: &str) -> Option<NodeIndex> {
        self.index.get(code).copied()
    }

    /// Edges leaving `node` (towards its dependents).
    pub fn outgoing(&self, node: NodeIndex) -> impl Iterator<Item = &DependencyEdge> + '_ {
        self.outgoing[node].iter().map(move |&e| &self.edges[e])
    }

    /// Edges entering `node` (from what it depends on).
    pub fn incoming(&self, node: NodeIndex) -> impl Iterator<Item = &DependencyEdge> + '_ {
        self.incoming[node].iter().map(move |&e| &self.edges[e])
    }

    /// The `i`-th edge entering `node`, in the same order as [`Self::incoming`].
    pub fn incoming_edge(&self, node: NodeIndex, i: usize) -> Option<&DependencyEdge> {
        self.incoming[node].get(i).map(|&e| &self.edges[e])
    }

    /// Number of edges entering `node`.
    pub fn in_degree(&self, node: NodeIndex) -> usize {
        self.incoming[node].len()
    }

    /// Number of edges leaving `node`.
    pub fn out_degree(&self, node: NodeIndex) -> usize {
        self.outgoing[node].len()
    }
}

/// Builds the dependency graph for one scheduling run.
///
/// Every dependency endpoint must name an activity in `activities`;
/// dependencies reaching outside the run (another project, a missing
/// record) fail with [`ScheduleError::UnknownActivityReference`].
/// Repeated `(activity, depends_on, kind)` triples collapse into one edge.
pub fn build_graph(activities: &[Activity], dependencies: &[Dependency]) -> Result<ActivityGraph> {
    let mut nodes = Vec::with_capacity(activities.len());
    let mut index = HashMap::with_capacity(activities.len());

    for (i, act) in activities.iter().enumerate() {
        if index.insert(act.code.clone(), i).is_some() {
            return Err(ScheduleError::DuplicateActivity {
                activity_id: act.code.clone(),
            });
        }
        let duration_days = act.duration_days();
        if duration_days < 0 {
            return Err(ScheduleError::InvalidActivity {
                activity_id: act.code.clone(),
                reason: format!(
                    "end date {} precedes start date {}",
                    act.end_date, act.start_date
                ),
            });
        }
        nodes.push(ActivityNode {
            code: act.code.clone(),
            phase: act.phase.clone(),
            duration_days,
            flexible: act.flexible,
        });
    }

    let resolve = |code: &str, referenced_by: &str| {
        index
            .get(code)
            .copied()
            .ok_or_else(|| ScheduleError::UnknownActivityReference {
                activity_id: code.to_string(),
                referenced_by: referenced_by.to_string(),
            })
    };

    let mut edges = Vec::with_capacity(dependencies.len());
    let mut seen = HashSet::with_capacity(dependencies.len());
    for dep in dependencies {
        let successor = resolve(&dep.activity, &dep.depends_on)?;
        let predecessor = resolve(&dep.depends_on, &dep.activity)?;
        if !seen.insert((predecessor, successor, dep.kind)) {
            warn!(
                activity = %dep.activity,
                depends_on = %dep.depends_on,
                kind = %dep.kind,
                "duplicate dependency collapsed"
            );
            continue;
        }
        edges.push(DependencyEdge {
            predecessor,
            successor,
            kind: dep.kind,
        });
    }

    let mut outgoing = vec![Vec::new(); nodes.len()];
    let mut incoming = vec![Vec::new(); nodes.len()];
    for (e, edge) in edges.iter().enumerate() {
        outgoing[edge.predecessor].push(e);
        incoming[edge.successor].push(e);
    }
    for list in &mut outgoing {
        list.sort_by(|&a, &b| {
            let (ea, eb) = (&edges[a], &edges[b]);
            nodes[ea.successor]
                .code
                .cmp(&nodes[eb.successor].code)
                .then(ea.kind.cmp(&eb.kind))
        });
    }
    for list in &mut incoming {
        list.sort_by(|&a, &b| {
            let (ea, eb) = (&edges[a], &edges[b]);
            nodes[ea.predecessor]
                .code
                .cmp(&nodes[eb.predecessor].code)
                .then(ea.kind.cmp(&eb.kind))
        });
    }

    debug!(nodes = nodes.len(), edges = edges.len(), "dependency graph built");

    Ok(ActivityGraph {
        nodes,
        edges,
        outgoing,
        incoming,
        index,
    })
}
