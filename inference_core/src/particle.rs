//! Mobile entities moving along the walking graph.
//!
//! A particle stores only its live edge position plus a chronologically
//! ordered list of `(time, node)` transition events. Any past position is
//! reconstructed from that list by binary search and constant-velocity
//! interpolation.
//!
//! # History layout
//! - The first event is the (possibly negative) time at which the particle
//!   would have stood on the source node of its starting edge.
//! - Each `advance` appends the arrival at every node it reaches, and also the
//!   scheduled arrival at the target of the edge it stops on. That last event
//!   may lie in the future; the next `advance` re-times it.

use crate::error::SimError;
use crate::types::ObjectId;
use floor_model::{LandmarkPosition, NodeId, WalkingGraph};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Length of one default advance step (time units).
pub const UNIT_STEP: f64 = 1.0;
/// Mean of the velocity distribution for new particles.
pub const VELOCITY_MEAN: f64 = 80.0;
/// Standard deviation of the velocity distribution for new particles.
pub const VELOCITY_STD: f64 = 10.0;
/// Standard deviation of the velocity re-draw for derived particles.
pub const JITTER_STD: f64 = 5.0;

/// Arrival of a particle at `node` at `time`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub time: f64,
    pub node: NodeId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Particle {
    id: ObjectId,
    velocity: f64,
    pos: LandmarkPosition,
    /// Time of the live position.
    now: f64,
    history: Vec<HistoryEvent>,
}

/// Normal(mean, std_dev) draw, repeated until positive.
fn draw_velocity<R: Rng + ?Sized>(mean: f64, std_dev: f64, rng: &mut R) -> f64 {
    loop {
        let z: f64 = StandardNormal.sample(rng);
        let v = mean + std_dev * z;
        if v > 0.0 {
            return v;
        }
    }
}

impl Particle {
    /// New particle at `start`, or at a uniformly random position when `None`.
    ///
    /// The velocity is drawn before the position.
    pub fn new<G, R>(graph: &G, id: ObjectId, start: Option<LandmarkPosition>, rng: &mut R) -> Self
    where
        G: WalkingGraph,
        R: Rng + ?Sized,
    {
        let velocity = draw_velocity(VELOCITY_MEAN, VELOCITY_STD, rng);
        let pos = match start {
            Some(pos) => pos,
            None => graph.random_position(rng),
        };
        Self::seeded(graph, id, pos, velocity)
    }

    /// New particle with a fixed velocity.
    pub fn with_velocity<G: WalkingGraph>(
        graph: &G,
        id: ObjectId,
        start: LandmarkPosition,
        velocity: f64,
    ) -> Result<Self, SimError> {
        if !(velocity > 0.0) || !velocity.is_finite() {
            return Err(SimError::DegenerateGeometry(format!(
                "particle velocity {velocity} must be positive"
            )));
        }
        Ok(Self::seeded(graph, id, start, velocity))
    }

    fn seeded<G: WalkingGraph>(graph: &G, id: ObjectId, pos: LandmarkPosition, velocity: f64) -> Self {
        let weight = graph.edge_weight(pos.source, pos.target);
        Self {
            id,
            velocity,
            pos,
            now: 0.0,
            history: vec![HistoryEvent {
                time: -pos.fraction * weight / velocity,
                node: pos.source,
            }],
        }
    }

    /// Copy of `parent` (id, position, history) with a velocity re-drawn from
    /// Normal(parent velocity, [`JITTER_STD`]). Use `clone()` for an exact twin.
    pub fn derive_with_jitter<R: Rng + ?Sized>(parent: &Particle, rng: &mut R) -> Self {
        Self {
            velocity: draw_velocity(parent.velocity, JITTER_STD, rng),
            ..parent.clone()
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Live position.
    pub fn position(&self) -> LandmarkPosition {
        self.pos
    }

    /// Time of the live position.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn history(&self) -> &[HistoryEvent] {
        &self.history
    }

    /// Move forward by `duration` time units (one [`UNIT_STEP`] when `None`
    /// or non-positive), possibly crossing several edges.
    ///
    /// At each node reached the next edge comes from the graph's weighted
    /// choice, excluding the node just left. A node without outgoing edges
    /// stops the particle there, at rest.
    pub fn advance<G, R>(&mut self, graph: &G, duration: Option<f64>, rng: &mut R) -> LandmarkPosition
    where
        G: WalkingGraph,
        R: Rng + ?Sized,
    {
        let span = match duration {
            Some(d) if d > 0.0 => d,
            _ => UNIT_STEP,
        };

        // Drop the arrival scheduled for the current target; it is re-timed below.
        if !self.pos.is_at_rest()
            && self.history.len() > 1
            && self.history.last().map(|e| e.node) == Some(self.pos.target)
        {
            self.history.pop();
        }

        let mut left = graph.edge_weight(self.pos.source, self.pos.target) * (1.0 - self.pos.fraction);
        let mut dist = span * self.velocity - left;
        let mut elapsed = self.now;
        self.now += span;

        loop {
            elapsed += left / self.velocity;
            self.history.push(HistoryEvent {
                time: elapsed,
                node: self.pos.target,
            });

            if dist < 0.0 {
                break;
            }

            let previous = self.pos.source;
            let arrived = self.pos.target;
            match graph.random_next_edge(arrived, previous, rng) {
                Some(next) => {
                    self.pos.source = arrived;
                    self.pos.target = next;
                    left = graph.edge_weight(arrived, next);
                    dist -= left;
                }
                None => {
                    self.pos = LandmarkPosition::at_rest(arrived);
                    return self.pos;
                }
            }
        }

        // dist ∈ [-weight, 0) here, so the fraction is already in [0, 1).
        let weight = graph.edge_weight(self.pos.source, self.pos.target);
        self.pos.fraction = if weight > 0.0 {
            (1.0 + dist / weight).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.pos
    }

    /// Position at time `t`; the live position when `t` is negative.
    ///
    /// Past the last recorded event the particle keeps its velocity along the
    /// live edge and comes to rest at the furthest node it is known to reach.
    pub fn position_at<G: WalkingGraph>(&self, graph: &G, t: f64) -> LandmarkPosition {
        if t < 0.0 {
            return self.pos;
        }

        let idx = self.history.partition_point(|e| e.time <= t);
        if idx == 0 {
            return LandmarkPosition::at_rest(self.history[0].node);
        }

        if let Some(next) = self.history.get(idx) {
            let prev = &self.history[idx - 1];
            let weight = graph.edge_weight(prev.node, next.node);
            let fraction = if weight > 0.0 {
                ((t - prev.time) * self.velocity / weight).clamp(0.0, 1.0)
            } else {
                0.0
            };
            return LandmarkPosition::new(prev.node, next.node, fraction);
        }

        let last = &self.history[self.history.len() - 1];
        if !self.pos.is_at_rest() && last.node == self.pos.source {
            let weight = graph.edge_weight(self.pos.source, self.pos.target);
            let travelled = (t - last.time) * self.velocity;
            if weight > 0.0 && travelled <= weight {
                return LandmarkPosition::new(self.pos.source, self.pos.target, travelled / weight);
            }
            return LandmarkPosition::at_rest(self.pos.target);
        }
        LandmarkPosition::at_rest(last.node)
    }

    /// Dump the history as `time node` lines.
    pub fn write_history<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for e in &self.history {
            writeln!(out, "{} {}", e.time, e.node)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use floor_model::{FloorPlan, Rect, RegionKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// 3×3 lattice of 100-unit passages.
    fn lattice() -> FloorPlan {
        let mut b = FloorPlan::builder();
        let mut ids = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                ids.push(b.add_node(x as f64 * 100.0, y as f64 * 100.0));
            }
        }
        for y in 0..3 {
            for x in 0..3 {
                let i = y * 3 + x;
                if x < 2 {
                    b.add_passage(ids[i], ids[i + 1]);
                }
                if y < 2 {
                    b.add_passage(ids[i], ids[i + 3]);
                }
            }
        }
        b.add_region("floor", RegionKind::Hall, Rect::from_coords(-5.0, -5.0, 205.0, 205.0));
        b.build().unwrap()
    }

    /// A(0,0)--B(10,0), either two-way or one-way A→B.
    fn segment(two_way: bool) -> FloorPlan {
        let mut b = FloorPlan::builder();
        let a = b.add_node(0.0, 0.0);
        let z = b.add_node(10.0, 0.0);
        if two_way {
            b.add_passage(a, z);
        } else {
            b.add_one_way(a, z);
        }
        b.add_region("hall", RegionKind::Hall, Rect::from_coords(-1.0, -1.0, 11.0, 1.0));
        b.build().unwrap()
    }

    fn assert_same_position(g: &FloorPlan, a: &LandmarkPosition, b: &LandmarkPosition) {
        let pa = g.position_coordinate(a);
        let pb = g.position_coordinate(b);
        assert_abs_diff_eq!(pa.x, pb.x, epsilon = 1e-6);
        assert_abs_diff_eq!(pa.y, pb.y, epsilon = 1e-6);
    }

    #[test]
    fn new_particle_history_starts_at_source() {
        let g = lattice();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let p = Particle::new(&g, ObjectId(3), None, &mut rng);
        assert!(p.velocity() > 0.0);
        assert_eq!(p.history().len(), 1);

        let pos = p.position();
        let expected = -pos.fraction * g.edge_weight(pos.source, pos.target) / p.velocity();
        assert_abs_diff_eq!(p.history()[0].time, expected, epsilon = 1e-12);
        assert_eq!(p.history()[0].node, pos.source);
    }

    #[test]
    fn history_is_non_decreasing_and_never_empty() {
        let g = lattice();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for id in 0..20 {
            let mut p = Particle::new(&g, ObjectId(id), None, &mut rng);
            for step in 0..200 {
                let d = if step % 7 == 0 { Some(0.35) } else { None };
                p.advance(&g, d, &mut rng);
                assert!(!p.history().is_empty());
            }
            assert!(
                p.history().windows(2).all(|w| w[0].time <= w[1].time),
                "history of particle {id} must be chronological"
            );
        }
    }

    #[test]
    fn position_at_event_time_is_at_event_node() {
        let g = lattice();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut p = Particle::new(&g, ObjectId(0), None, &mut rng);
        for _ in 0..50 {
            p.advance(&g, None, &mut rng);
        }
        let h = p.history();
        for e in &h[1..h.len() - 1] {
            let pos = p.position_at(&g, e.time);
            assert_eq!(pos.source, e.node);
            assert_abs_diff_eq!(pos.fraction, 0.0, epsilon = 1e-9);
        }
        let last = h[h.len() - 1];
        let pos = p.position_at(&g, last.time);
        assert_eq!(pos, LandmarkPosition::at_rest(last.node));
    }

    #[test]
    fn advance_then_query_matches_live_position() {
        let g = lattice();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for id in 0..10 {
            let mut p = Particle::new(&g, ObjectId(id), None, &mut rng);
            for step in 0..40 {
                let d = if step % 3 == 0 { Some(2.5) } else { None };
                let before = p.now();
                let live = p.advance(&g, d, &mut rng);
                let span = d.unwrap_or(UNIT_STEP);
                assert_abs_diff_eq!(p.now(), before + span, epsilon = 1e-12);
                let replayed = p.position_at(&g, before + span);
                assert_same_position(&g, &replayed, &live);
            }
        }
    }

    #[test]
    fn past_positions_survive_later_advances() {
        let g = lattice();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut p = Particle::new(&g, ObjectId(0), None, &mut rng);
        let mut snapshots = Vec::new();
        for _ in 0..30 {
            let live = p.advance(&g, None, &mut rng);
            snapshots.push((p.now(), live));
        }
        for (t, live) in &snapshots {
            assert_same_position(&g, &p.position_at(&g, *t), live);
        }
    }

    #[test]
    fn fraction_stays_in_unit_interval() {
        let g = lattice();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut p = Particle::new(&g, ObjectId(0), None, &mut rng);
        for step in 0..500 {
            let d = if step % 2 == 0 { Some(0.1 + (step % 13) as f64) } else { None };
            let pos = p.advance(&g, d, &mut rng);
            assert!((0.0..=1.0).contains(&pos.fraction), "fraction {}", pos.fraction);
        }
    }

    #[test]
    fn negative_time_returns_live_position() {
        let g = lattice();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut p = Particle::new(&g, ObjectId(0), None, &mut rng);
        p.advance(&g, Some(3.0), &mut rng);
        assert_eq!(p.position_at(&g, -1.0), p.position());
    }

    #[test]
    fn extrapolation_clamps_at_rest() {
        let g = segment(true);
        // Fresh particle half-way along A→B at velocity 10: reaches B at t = 0.5.
        let start = LandmarkPosition::new(NodeId(0), NodeId(1), 0.5);
        let p = Particle::with_velocity(&g, ObjectId(0), start, 10.0).unwrap();
        let mid = p.position_at(&g, 0.25);
        assert_abs_diff_eq!(mid.fraction, 0.75, epsilon = 1e-12);
        assert_eq!(p.position_at(&g, 5.0), LandmarkPosition::at_rest(NodeId(1)));

        // After an advance the last event is the scheduled arrival; beyond it, rest there.
        let mut p = p;
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        p.advance(&g, Some(0.2), &mut rng);
        assert_eq!(p.position_at(&g, 100.0), LandmarkPosition::at_rest(NodeId(1)));
    }

    #[test]
    fn two_node_advance_reaches_boundary_and_turns_back() {
        let g = segment(true);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let start = LandmarkPosition::new(NodeId(0), NodeId(1), 0.0);
        let mut p = Particle::with_velocity(&g, ObjectId(0), start, 10.0).unwrap();

        let pos = p.advance(&g, Some(1.0), &mut rng);
        // Exactly at B; the only way on is back toward A.
        assert_eq!(pos, LandmarkPosition::new(NodeId(1), NodeId(0), 0.0));
        assert_abs_diff_eq!(g.position_coordinate(&pos).x, 10.0, epsilon = 1e-12);
        assert_eq!(
            p.history().iter().map(|e| e.node).collect::<Vec<_>>(),
            vec![NodeId(0), NodeId(1), NodeId(0)]
        );
        assert_abs_diff_eq!(p.history()[1].time, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn two_node_one_way_advance_parks_at_sink() {
        let g = segment(false);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let start = LandmarkPosition::new(NodeId(0), NodeId(1), 0.0);
        let mut p = Particle::with_velocity(&g, ObjectId(0), start, 10.0).unwrap();

        let pos = p.advance(&g, Some(1.0), &mut rng);
        assert_eq!(pos, LandmarkPosition::at_rest(NodeId(1)));
        let pos = p.advance(&g, None, &mut rng);
        assert_eq!(pos, LandmarkPosition::at_rest(NodeId(1)));
        assert_eq!(p.position_at(&g, 0.5).fraction, 0.5);
    }

    #[test]
    fn non_positive_velocity_is_degenerate() {
        let g = segment(true);
        let start = LandmarkPosition::at_rest(NodeId(0));
        assert!(matches!(
            Particle::with_velocity(&g, ObjectId(0), start, 0.0),
            Err(SimError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn jittered_derivative_keeps_state_but_not_velocity() {
        let g = lattice();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut parent = Particle::new(&g, ObjectId(5), None, &mut rng);
        parent.advance(&g, Some(4.0), &mut rng);

        let child = Particle::derive_with_jitter(&parent, &mut rng);
        assert_eq!(child.id(), parent.id());
        assert_eq!(child.position(), parent.position());
        assert_eq!(child.history(), parent.history());
        assert!(child.velocity() > 0.0);
        assert_ne!(child.velocity(), parent.velocity());

        let twin = parent.clone();
        assert_eq!(twin.velocity(), parent.velocity());
    }

    #[test]
    fn write_history_prints_one_line_per_event() {
        let g = lattice();
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let mut p = Particle::new(&g, ObjectId::SYNTHETIC, None, &mut rng);
        p.advance(&g, Some(10.0), &mut rng);
        let mut buf = Vec::new();
        p.write_history(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), p.history().len());
    }
}
