//! `floor_model` — Walking graph, indoor geometry and spatial indexing.
//!
//! # Module layout
//! - [`position`]   — Node/detector/anchor identifiers and `LandmarkPosition`
//! - [`geometry`]   — 2D points, axis-aligned rectangles, interpolation
//! - [`graph`]      — The `WalkingGraph` trait consumed by the simulator core
//! - [`floor_plan`] — Concrete floor plan: rooms, halls, passages, detectors, anchors
//! - [`index`]      — Uniform-grid point index for window range queries

pub mod error;
pub mod floor_plan;
pub mod geometry;
pub mod graph;
pub mod index;
pub mod position;

pub use error::FloorPlanError;
pub use floor_plan::{FloorPlan, FloorPlanBuilder, Region, RegionKind};
pub use geometry::{linear_interpolate, Point2, Rect};
pub use graph::WalkingGraph;
pub use index::PointIndex;
pub use position::{AnchorId, DetectorId, LandmarkPosition, NodeId};
