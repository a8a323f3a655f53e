//! Floor-plan construction errors.

use crate::position::NodeId;
use thiserror::Error;

/// Reasons a floor plan definition is rejected at build time.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FloorPlanError {
    #[error("edge references unknown node {0}")]
    UnknownNode(NodeId),

    #[error("self-loop on node {0} is not a passage")]
    SelfLoop(NodeId),

    #[error("degenerate edge {from}->{to}: length {length} must be positive")]
    DegenerateEdge {
        from: NodeId,
        to: NodeId,
        length: f64,
    },

    #[error("edge {from}->{to}: branch weight {weight} must be positive")]
    InvalidBranchWeight {
        from: NodeId,
        to: NodeId,
        weight: f64,
    },

    #[error("detector attached to unknown node {0}")]
    UnknownDetectorNode(NodeId),

    #[error("floor plan has no edges")]
    NoEdges,

    #[error("floor plan has no rooms or halls")]
    NoRegions,

    #[error("region '{0}' has zero area")]
    EmptyRegion(String),

    #[error("anchor spacing {0} must be positive")]
    InvalidAnchorSpacing(f64),
}
