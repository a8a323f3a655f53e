//! Identifiers and the edge-relative position record.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identifier types
// ---------------------------------------------------------------------------

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(pub usize);

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DetectorId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnchorId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DetectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// LandmarkPosition
// ---------------------------------------------------------------------------

/// A point on the directed edge `source → target`.
///
/// `fraction` is the progress along the edge: 0 is at `source`, 1 is at
/// `target`. `source == target` with `fraction == 0` means the walker is at
/// rest on that node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPosition {
    pub source: NodeId,
    pub target: NodeId,
    pub fraction: f64,
}

impl LandmarkPosition {
    pub fn new(source: NodeId, target: NodeId, fraction: f64) -> Self {
        Self {
            source,
            target,
            fraction,
        }
    }

    /// Stationary on `node`.
    pub fn at_rest(node: NodeId) -> Self {
        Self::new(node, node, 0.0)
    }

    pub fn is_at_rest(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for LandmarkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}@{:.3}", self.source, self.target, self.fraction)
    }
}
