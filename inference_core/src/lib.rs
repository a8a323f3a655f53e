//! `inference_core` — Core location-inference algorithms.
//!
//! # Module layout
//! - [`types`]     — Object ids, readings, the anchor mass map
//! - [`particle`]  — Mobile entity with compact event history (advance / position_at)
//! - [`predictor`] — Filter-resample reconstruction of candidate anchors
//! - [`metrics`]   — Recall / precision / F1 and per-window-size aggregation
//! - [`config`]    — Simulation parameters and validation
//! - [`error`]     — Error kinds

pub mod config;
pub mod error;
pub mod metrics;
pub mod particle;
pub mod predictor;
pub mod types;

pub use config::SimConfig;
pub use error::{PredictFailure, SimError};
pub use metrics::{Metric, MetricSummary, WindowStatistics};
pub use particle::{HistoryEvent, Particle};
pub use predictor::Predictor;
pub use types::{AnchorMap, ObjectId, Reading};
