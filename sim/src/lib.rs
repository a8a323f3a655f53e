//! `sim` — Simulation driver: ground truth, detections, window-query sweeps.

pub mod detector;
pub mod range_query;
pub mod scenarios;
pub mod simulation;

pub use detector::{detect, DetectionModel};
pub use range_query::range_query_windowsize;
pub use scenarios::{Scenario, ScenarioKind};
pub use simulation::Simulation;
