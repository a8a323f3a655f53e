//! Concrete indoor floor plan implementing [`WalkingGraph`].
//!
//! A floor plan is a set of nodes (doors, corridor junctions, room centres)
//! joined by passages, a set of detectors attached to nodes, and the rooms and
//! halls (axis-aligned rectangles) used to generate query windows. Anchors are
//! laid out on every node and at regular spacing along every passage.

use crate::{
    error::FloorPlanError,
    geometry::{linear_interpolate, Point2, Rect},
    graph::WalkingGraph,
    index::PointIndex,
    position::{AnchorId, DetectorId, LandmarkPosition, NodeId},
};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Kind of walkable area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionKind {
    Room,
    Hall,
}

/// A named room or hall.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub kind: RegionKind,
    pub rect: Rect,
}

#[derive(Clone, Debug)]
struct Edge {
    target: NodeId,
    length: f64,
    branch_weight: f64,
}

/// Intermediate anchors of one passage, keyed by its (lower, higher) node pair.
#[derive(Clone, Copy, Debug)]
struct EdgeAnchors {
    first: usize,
    segments: usize,
}

#[derive(Clone, Debug)]
struct PendingEdge {
    from: NodeId,
    to: NodeId,
    length: Option<f64>,
    branch_weight: f64,
    two_way: bool,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Incrementally describes a floor plan; [`FloorPlanBuilder::build`] validates it.
#[derive(Clone, Debug)]
pub struct FloorPlanBuilder {
    nodes: Vec<Point2>,
    edges: Vec<PendingEdge>,
    detectors: Vec<NodeId>,
    regions: Vec<Region>,
    anchor_spacing: f64,
    index_cell_size: f64,
}

impl Default for FloorPlanBuilder {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            detectors: Vec::new(),
            regions: Vec::new(),
            anchor_spacing: 10.0,
            index_cell_size: 25.0,
        }
    }
}

impl FloorPlanBuilder {
    pub fn add_node(&mut self, x: f64, y: f64) -> NodeId {
        self.nodes.push(Point2::new(x, y));
        NodeId(self.nodes.len() - 1)
    }

    /// Two-way passage whose length is the Euclidean distance between its ends.
    pub fn add_passage(&mut self, a: NodeId, b: NodeId) -> &mut Self {
        self.add_edge(a, b, None, 1.0, true)
    }

    /// One-way edge `from → to`.
    pub fn add_one_way(&mut self, from: NodeId, to: NodeId) -> &mut Self {
        self.add_edge(from, to, None, 1.0, false)
    }

    /// Fully specified edge. `length: None` uses the Euclidean distance.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        length: Option<f64>,
        branch_weight: f64,
        two_way: bool,
    ) -> &mut Self {
        self.edges.push(PendingEdge {
            from,
            to,
            length,
            branch_weight,
            two_way,
        });
        self
    }

    pub fn add_detector(&mut self, node: NodeId) -> DetectorId {
        self.detectors.push(node);
        DetectorId(self.detectors.len() - 1)
    }

    pub fn add_region(&mut self, name: impl Into<String>, kind: RegionKind, rect: Rect) -> &mut Self {
        self.regions.push(Region {
            name: name.into(),
            kind,
            rect,
        });
        self
    }

    pub fn anchor_spacing(&mut self, spacing: f64) -> &mut Self {
        self.anchor_spacing = spacing;
        self
    }

    pub fn index_cell_size(&mut self, cell: f64) -> &mut Self {
        self.index_cell_size = cell;
        self
    }

    pub fn build(&self) -> Result<FloorPlan, FloorPlanError> {
        if !(self.anchor_spacing > 0.0) {
            return Err(FloorPlanError::InvalidAnchorSpacing(self.anchor_spacing));
        }

        let n = self.nodes.len();
        let check = |id: NodeId| {
            if id.0 < n {
                Ok(id)
            } else {
                Err(FloorPlanError::UnknownNode(id))
            }
        };

        let mut adjacency: Vec<Vec<Edge>> = vec![Vec::new(); n];
        let mut directed: Vec<(NodeId, NodeId)> = Vec::new();
        let mut lengths: Vec<f64> = Vec::new();
        let mut passages: Vec<(NodeId, NodeId, f64)> = Vec::new();

        for e in &self.edges {
            let from = check(e.from)?;
            let to = check(e.to)?;
            if from == to {
                return Err(FloorPlanError::SelfLoop(from));
            }
            let length = e
                .length
                .unwrap_or_else(|| nalgebra::distance(&self.nodes[from.0], &self.nodes[to.0]));
            if !(length > 0.0) || !length.is_finite() {
                return Err(FloorPlanError::DegenerateEdge { from, to, length });
            }
            if !(e.branch_weight > 0.0) {
                return Err(FloorPlanError::InvalidBranchWeight {
                    from,
                    to,
                    weight: e.branch_weight,
                });
            }

            let mut link = |a: NodeId, b: NodeId| {
                adjacency[a.0].push(Edge {
                    target: b,
                    length,
                    branch_weight: e.branch_weight,
                });
                directed.push((a, b));
                lengths.push(length);
            };
            link(from, to);
            if e.two_way {
                link(to, from);
            }
            passages.push((from.min(to), from.max(to), length));
        }

        if directed.is_empty() {
            return Err(FloorPlanError::NoEdges);
        }
        let edge_picker = WeightedIndex::new(&lengths).map_err(|_| FloorPlanError::NoEdges)?;

        for &node in &self.detectors {
            if node.0 >= n {
                return Err(FloorPlanError::UnknownDetectorNode(node));
            }
        }

        if self.regions.is_empty() {
            return Err(FloorPlanError::NoRegions);
        }
        for r in &self.regions {
            if !(r.rect.area() > 0.0) {
                return Err(FloorPlanError::EmptyRegion(r.name.clone()));
            }
        }
        let total_area: f64 = self.regions.iter().map(|r| r.rect.area()).sum();
        let region_picker = WeightedIndex::new(self.regions.iter().map(|r| r.rect.area()))
            .map_err(|_| FloorPlanError::NoRegions)?;

        // Node anchors share the node's index; passage anchors follow.
        let mut anchors: Vec<Point2> = self.nodes.clone();
        let mut edge_anchors = HashMap::new();
        for (lo, hi, length) in passages {
            if edge_anchors.contains_key(&(lo, hi)) {
                continue;
            }
            let segments = ((length / self.anchor_spacing).ceil() as usize).max(1);
            let first = anchors.len();
            for k in 1..segments {
                anchors.push(linear_interpolate(
                    &self.nodes[lo.0],
                    &self.nodes[hi.0],
                    k as f64 / segments as f64,
                ));
            }
            edge_anchors.insert((lo, hi), EdgeAnchors { first, segments });
        }

        let mut anchor_index = PointIndex::new(self.index_cell_size);
        anchor_index.insert_batch(
            anchors
                .iter()
                .enumerate()
                .map(|(i, p)| (*p, AnchorId(i))),
        );

        let mut detector_index = PointIndex::new(self.index_cell_size);
        detector_index.insert_batch(
            self.detectors
                .iter()
                .enumerate()
                .map(|(i, node)| (self.nodes[node.0], DetectorId(i))),
        );

        debug!(
            nodes = n,
            edges = directed.len(),
            detectors = self.detectors.len(),
            anchors = anchors.len(),
            "floor plan built"
        );

        Ok(FloorPlan {
            nodes: self.nodes.clone(),
            adjacency,
            directed,
            edge_picker,
            detectors: self.detectors.clone(),
            detector_index,
            regions: self.regions.clone(),
            region_picker,
            total_area,
            anchors,
            anchor_index,
            edge_anchors,
        })
    }
}

// ---------------------------------------------------------------------------
// FloorPlan
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct FloorPlan {
    nodes: Vec<Point2>,
    adjacency: Vec<Vec<Edge>>,
    /// Every directed edge, parallel to the weights of `edge_picker`.
    directed: Vec<(NodeId, NodeId)>,
    edge_picker: WeightedIndex<f64>,
    detectors: Vec<NodeId>,
    detector_index: PointIndex<DetectorId>,
    regions: Vec<Region>,
    region_picker: WeightedIndex<f64>,
    total_area: f64,
    anchors: Vec<Point2>,
    anchor_index: PointIndex<AnchorId>,
    edge_anchors: HashMap<(NodeId, NodeId), EdgeAnchors>,
}

impl FloorPlan {
    pub fn builder() -> FloorPlanBuilder {
        FloorPlanBuilder::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn detector_count(&self) -> usize {
        self.detectors.len()
    }

    pub fn detector_node(&self, detector: DetectorId) -> Option<NodeId> {
        self.detectors.get(detector.0).copied()
    }

    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn anchor_coordinate(&self, anchor: AnchorId) -> Option<Point2> {
        self.anchors.get(anchor.0).copied()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Sum of room and hall areas.
    pub fn total_area(&self) -> f64 {
        self.total_area
    }

    pub fn neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.adjacency
            .get(node.0)
            .into_iter()
            .flatten()
            .map(|e| e.target)
    }
}

impl WalkingGraph for FloorPlan {
    fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> LandmarkPosition {
        let (source, target) = self.directed[self.edge_picker.sample(rng)];
        LandmarkPosition::new(source, target, rng.gen::<f64>())
    }

    fn edge_weight(&self, source: NodeId, target: NodeId) -> f64 {
        if source == target {
            return 0.0;
        }
        self.adjacency
            .get(source.0)
            .and_then(|out| out.iter().find(|e| e.target == target))
            .map_or(0.0, |e| e.length)
    }

    fn random_next_edge<R: Rng + ?Sized>(
        &self,
        current: NodeId,
        exclude: NodeId,
        rng: &mut R,
    ) -> Option<NodeId> {
        let out = self.adjacency.get(current.0)?;
        let total: f64 = out
            .iter()
            .filter(|e| e.target != exclude)
            .map(|e| e.branch_weight)
            .sum();

        // Only the way back is open: turn around.
        if total <= 0.0 {
            return out.first().map(|e| e.target);
        }

        let mut u = rng.gen::<f64>() * total;
        let mut last = None;
        for e in out.iter().filter(|e| e.target != exclude) {
            if u < e.branch_weight {
                return Some(e.target);
            }
            u -= e.branch_weight;
            last = Some(e.target);
        }
        last
    }

    fn coordinate_of(&self, node: NodeId) -> Point2 {
        self.nodes[node.0]
    }

    fn detector_position(&self, detector: DetectorId) -> Option<LandmarkPosition> {
        self.detector_node(detector).map(LandmarkPosition::at_rest)
    }

    fn detector_coverage(&self, pos: &LandmarkPosition, radius: f64) -> Option<DetectorId> {
        let p = self.position_coordinate(pos);
        self.detector_index
            .within_radius(&p, radius)
            .into_iter()
            .min_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)))
            .map(|(_, id)| *id)
    }

    fn covered_by(&self, pos: &LandmarkPosition, radius: f64, expected: DetectorId) -> bool {
        match self.detector_node(expected) {
            Some(node) => {
                let p = self.position_coordinate(pos);
                nalgebra::distance(&p, &self.nodes[node.0]) <= radius
            }
            None => false,
        }
    }

    fn nearest_anchor(&self, pos: &LandmarkPosition) -> AnchorId {
        if pos.is_at_rest() || pos.fraction <= 0.0 {
            return AnchorId(pos.source.0);
        }
        if pos.fraction >= 1.0 {
            return AnchorId(pos.target.0);
        }

        let (lo, hi, along) = if pos.source < pos.target {
            (pos.source, pos.target, pos.fraction)
        } else {
            (pos.target, pos.source, 1.0 - pos.fraction)
        };

        match self.edge_anchors.get(&(lo, hi)) {
            Some(ea) => {
                let k = (along * ea.segments as f64).round() as usize;
                if k == 0 {
                    AnchorId(lo.0)
                } else if k >= ea.segments {
                    AnchorId(hi.0)
                } else {
                    AnchorId(ea.first + k - 1)
                }
            }
            None if along < 0.5 => AnchorId(lo.0),
            None => AnchorId(hi.0),
        }
    }

    fn anchors_in(&self, window: &Rect) -> Vec<AnchorId> {
        self.anchor_index
            .range_query(window)
            .into_iter()
            .copied()
            .collect()
    }

    fn random_window<R: Rng + ?Sized>(&self, ratio: f64, rng: &mut R) -> Vec<(Rect, f64)> {
        let side = (ratio * self.total_area).sqrt();
        let region = &self.regions[self.region_picker.sample(rng)].rect;
        let center = Point2::new(
            region.min.x + rng.gen::<f64>() * region.width(),
            region.min.y + rng.gen::<f64>() * region.height(),
        );
        let window = Rect::centered(&center, side);
        let area = window.area();
        if area <= 0.0 {
            return Vec::new();
        }

        self.regions
            .iter()
            .filter_map(|r| r.rect.intersection(&window))
            .map(|piece| {
                let share = piece.area() / area;
                (piece, share)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
