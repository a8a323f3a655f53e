//! Error kinds for the simulator core.

use floor_model::{DetectorId, FloorPlanError};
use thiserror::Error;

/// Unrecoverable input violations. These fail fast.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: `{param}` {reason}")]
    InvalidConfig { param: &'static str, reason: String },

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error(transparent)]
    FloorPlan(#[from] FloorPlanError),
}

impl SimError {
    pub(crate) fn config(param: &'static str, reason: impl Into<String>) -> Self {
        SimError::InvalidConfig {
            param,
            reason: reason.into(),
        }
    }
}

/// Expected ways a single prediction can fail. Callers skip the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PredictFailure {
    #[error("only {found} of {required} distinct observations before the query time")]
    InsufficientEvidence { found: usize, required: usize },

    #[error("every provisional particle was eliminated at timestep {step}")]
    FilterCollapse { step: usize },

    #[error("reading refers to unknown detector {0}")]
    UnknownDetector(DetectorId),
}
