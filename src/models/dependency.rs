//! Dependency (precedence) model.
//!
//! A dependency says `activity` depends on `depends_on`: some event of
//! `activity` (its start or finish) may not happen before some event of
//! `depends_on`. Which events are tied together is fixed by the
//! [`DependencyKind`].
//!
//! | Kind | Predecessor event | Successor event |
//! |------|-------------------|-----------------|
//! | finish_to_start | finish | start |
//! | start_to_start | start | start |
//! | finish_to_finish | finish | finish |
//! | start_to_finish | start | finish |
//!
//! # Reference
//! Moder, Phillips & Davis (1983), "Project Management with CPM, PERT and
//! Precedence Diagramming", Ch. 4

use serde::{Deserialize, Serialize};
use std::fmt;

/// A directed precedence edge: `activity` depends on `depends_on`.
///
/// Unique by `(activity, depends_on, kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Code of the dependent (successor) activity.
    pub activity: String,
    /// Code of the activity depended upon (predecessor).
    pub depends_on: String,
    /// Relation between the two activities' events.
    #[serde(rename = "dependency_type")]
    pub kind: DependencyKind,
}

impl Dependency {
    /// Creates a dependency of `activity` on `depends_on`.
    pub fn new(
        activity: impl Into<String>,
        depends_on: impl Into<String>,
        kind: DependencyKind,
    ) -> Self {
        Self {
            activity: activity.into(),
            depends_on: depends_on.into(),
            kind,
        }
    }

    /// `activity` starts after `depends_on` finishes.
    pub fn finish_to_start(activity: impl Into<String>, depends_on: impl Into<String>) -> Self {
        Self::new(activity, depends_on, DependencyKind::FinishToStart)
    }

    /// `activity` starts after `depends_on` starts.
    pub fn start_to_start(activity: impl Into<String>, depends_on: impl Into<String>) -> Self {
        Self::new(activity, depends_on, DependencyKind::StartToStart)
    }

    /// `activity` finishes after `depends_on` finishes.
    pub fn finish_to_finish(activity: impl Into<String>, depends_on: impl Into<String>) -> Self {
        Self::new(activity, depends_on, DependencyKind::FinishToFinish)
    }

    /// `activity` finishes after `depends_on` starts.
    pub fn start_to_finish(activity: impl Into<String>, depends_on: impl Into<String>) -> Self {
        Self::new(activity, depends_on, DependencyKind::StartToFinish)
    }
}

/// An activity event a relation is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// The activity's start.
    Start,
    /// The activity's finish.
    Finish,
}

/// The four precedence relation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Successor starts no earlier than predecessor finishes.
    FinishToStart,
    /// Successor starts no earlier than predecessor starts.
    StartToStart,
    /// Successor finishes no earlier than predecessor finishes.
    FinishToFinish,
    /// Successor finishes no earlier than predecessor starts.
    StartToFinish,
}

impl DependencyKind {
    /// All relation kinds.
    pub const ALL: [DependencyKind; 4] = [
        Self::FinishToStart,
        Self::StartToStart,
        Self::FinishToFinish,
        Self::StartToFinish,
    ];

    /// `(predecessor event, successor event)` tied together by this relation.
    pub fn anchors(self) -> (Anchor, Anchor) {
        match self {
            Self::FinishToStart => (Anchor::Finish, Anchor::Start),
            Self::StartToStart => (Anchor::Start, Anchor::Start),
            Self::FinishToFinish => (Anchor::Finish, Anchor::Finish),
            Self::StartToFinish => (Anchor::Start, Anchor::Finish),
        }
    }

    /// The predecessor's event this relation reads.
    #[inline]
    pub fn predecessor_anchor(self) -> Anchor {
        self.anchors().0
    }

    /// The successor's event this relation constrains.
    #[inline]
    pub fn successor_anchor(self) -> Anchor {
        self.anchors().1
    }

    /// Stable string form, identical to the serialized value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FinishToStart => "finish_to_start",
            Self::StartToStart => "start_to_start",
            Self::FinishToFinish => "finish_to_finish",
            Self::StartToFinish => "start_to_finish",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
