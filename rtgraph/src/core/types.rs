//! Shared deterministic types for the graph core.
//!
//! These types define stable contracts between the parser, builder, linker
//! and emitter. They carry no I/O and serialize with stable lowercase names.

use serde::{Deserialize, Serialize};

/// Stable handle of a container inside one actor's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// How a container is refined into its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decomposition {
    #[default]
    None,
    And,
    Or,
    MeansEnd,
}

impl Decomposition {
    /// True for AND/OR refinements, the ones governed by annotation rules.
    pub fn is_and_or(self) -> bool {
        matches!(self, Decomposition::And | Decomposition::Or)
    }
}

/// Repetition style attached by `@n` (sequential) or `+n` (parallel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardinalityKind {
    Seq,
    Par,
}

/// Repetition of one element: `count` steps or branches of `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardinality {
    pub kind: CardinalityKind,
    pub count: u32,
}

/// Goal intention type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    #[default]
    Achieve,
    Request,
}

/// Which side of a `try(..)?success:failure` an element belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TryBranch {
    Success,
    Failure,
}

/// Temporal placement of a child relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalClass {
    /// Runs after the previous sibling on the same path.
    Sequential,
    /// Opens a new time path alongside its siblings.
    Parallel,
    /// Inherits the parent's coordinates unchanged.
    Trivial,
}

/// Time coordinates of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeCoords {
    pub prev_time_path: u32,
    pub time_path: u32,
    pub fut_time_path: u32,
    pub time_slot: u32,
}

impl TimeCoords {
    /// Element-wise maximum, used when a shared node is placed a second time.
    pub fn merge_max(self, other: TimeCoords) -> TimeCoords {
        TimeCoords {
            prev_time_path: self.prev_time_path.max(other.prev_time_path),
            time_path: self.time_path.max(other.time_path),
            fut_time_path: self.fut_time_path.max(other.fut_time_path),
            time_slot: self.time_slot.max(other.time_slot),
        }
    }
}
