//! The walking-graph oracle consumed by particles, detectors and the predictor.
//!
//! Randomised operations take the caller's generator explicitly so that a
//! single seeded source drives the whole simulation in a fixed draw order.

use crate::geometry::{linear_interpolate, Point2, Rect};
use crate::position::{AnchorId, DetectorId, LandmarkPosition, NodeId};
use rand::Rng;

/// Weighted topological network with indoor geometry attached.
pub trait WalkingGraph {
    /// Uniformly random point on the network.
    fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> LandmarkPosition;

    /// Length of the edge `source → target`. Zero when `source == target`.
    fn edge_weight(&self, source: NodeId, target: NodeId) -> f64;

    /// Branch-weighted choice of the next node after arriving at `current`,
    /// avoiding `exclude` (the node just left) when any alternative exists.
    ///
    /// Returns `None` only when `current` has no outgoing edges.
    fn random_next_edge<R: Rng + ?Sized>(
        &self,
        current: NodeId,
        exclude: NodeId,
        rng: &mut R,
    ) -> Option<NodeId>;

    fn coordinate_of(&self, node: NodeId) -> Point2;

    /// Planar coordinate of an edge-relative position.
    fn position_coordinate(&self, pos: &LandmarkPosition) -> Point2 {
        linear_interpolate(
            &self.coordinate_of(pos.source),
            &self.coordinate_of(pos.target),
            pos.fraction,
        )
    }

    /// Where an object seen by `detector` is assumed to stand.
    fn detector_position(&self, detector: DetectorId) -> Option<LandmarkPosition>;

    /// Nearest detector whose coverage disc of `radius` contains `pos`.
    fn detector_coverage(&self, pos: &LandmarkPosition, radius: f64) -> Option<DetectorId>;

    /// Whether `expected` covers `pos` with the given `radius`.
    fn covered_by(&self, pos: &LandmarkPosition, radius: f64, expected: DetectorId) -> bool;

    /// Snap a position to its nearest anchor.
    fn nearest_anchor(&self, pos: &LandmarkPosition) -> AnchorId;

    /// Anchors enclosed by `window`.
    fn anchors_in(&self, window: &Rect) -> Vec<AnchorId>;

    /// A random query window of area `ratio` × total floor area, returned as
    /// its pieces clipped to each room/hall with each piece's area share.
    fn random_window<R: Rng + ?Sized>(&self, ratio: f64, rng: &mut R) -> Vec<(Rect, f64)>;
}
