//! Windowed range-query sweep: true occupancy vs. predicted occupancy.
//!
//! # Processing steps per query timestamp
//! 1. Draw a whole-unit timestamp in `[query_time_min, duration)`
//! 2. Predict every object into a fresh `AnchorMap` and index every object's
//!    true position
//! 3. For each window size, evaluate `tests_per_timestamp` random windows:
//!    the true id set comes from the point index, the predicted occupancy from
//!    the anchors inside the window
//! 4. Score trials whose true set is non-empty

use floor_model::{AnchorId, PointIndex, Rect, WalkingGraph};
use inference_core::types::Occupancy;
use inference_core::{AnchorMap, ObjectId, Particle, Predictor, Reading, SimConfig, WindowStatistics};
use rand::Rng;
use std::collections::BTreeSet;
use tracing::debug;

/// Cell size of the per-timestamp ground-truth index.
pub const TRUTH_INDEX_CELL: f64 = 25.0;

/// True ids and predicted occupancy inside one window (given as its pieces).
pub fn query_window<G: WalkingGraph>(
    graph: &G,
    truth: &PointIndex<ObjectId>,
    anchors: &AnchorMap,
    pieces: &[(Rect, f64)],
) -> (BTreeSet<ObjectId>, Occupancy) {
    let mut real = BTreeSet::new();
    // Pieces may share a boundary; an anchor on it counts once.
    let mut enclosed: BTreeSet<AnchorId> = BTreeSet::new();
    for (rect, _) in pieces {
        real.extend(truth.range_query(rect).into_iter().copied());
        enclosed.extend(graph.anchors_in(rect));
    }
    (real, anchors.accumulate(&enclosed))
}

/// Run the full sweep and return the aggregated statistics.
pub fn range_query_windowsize<G, R>(
    graph: &G,
    objects: &[Particle],
    readings: &[Vec<Reading>],
    config: &SimConfig,
    rng: &mut R,
) -> WindowStatistics
where
    G: WalkingGraph,
    R: Rng + ?Sized,
{
    let predictor = Predictor::from_config(config);
    let mut stats = WindowStatistics::new(config.window_sizes.clone(), config.threshold);

    for round in 0..config.num_timestamps {
        let timestamp = rng.gen_range(config.query_time_min..config.duration).floor();

        let mut anchors = AnchorMap::new();
        let mut truth = PointIndex::new(TRUTH_INDEX_CELL);
        let mut predicted = 0usize;
        for (object, reading) in objects.iter().zip(readings) {
            if predictor
                .predict(graph, object.id(), reading, timestamp, &mut anchors, rng)
                .is_ok()
            {
                predicted += 1;
            }
            let pos = object.position_at(graph, timestamp);
            truth.insert(graph.position_coordinate(&pos), object.id());
        }

        let mut scored = 0usize;
        for (w, &ratio) in config.window_sizes.iter().enumerate() {
            for _ in 0..config.tests_per_timestamp {
                let pieces = graph.random_window(ratio, rng);
                let (real, occupancy) = query_window(graph, &truth, &anchors, &pieces);
                if stats.record(w, &real, &occupancy) {
                    scored += 1;
                }
            }
        }

        debug!(
            round,
            timestamp,
            predicted,
            objects = objects.len(),
            scored,
            "query timestamp evaluated"
        );
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::{Scenario, ScenarioKind};
    use crate::simulation::Simulation;
    use approx::assert_abs_diff_eq;
    use floor_model::{LandmarkPosition, NodeId};
    use inference_core::Metric;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_config(base: &SimConfig) -> SimConfig {
        SimConfig {
            num_objects: 20,
            num_particles: 16,
            duration: 120.0,
            num_timestamps: 3,
            tests_per_timestamp: 20,
            ..base.clone()
        }
    }

    #[test]
    fn window_query_counts_shared_boundary_anchor_once() {
        let scenario = Scenario::build(ScenarioKind::Corridor).unwrap();
        let g = &scenario.plan;
        let mut anchors = AnchorMap::new();
        let on_boundary = g.anchors_in(&Rect::from_coords(99.0, -1.0, 101.0, 1.0));
        assert_eq!(on_boundary.len(), 1);
        anchors.add(on_boundary[0], ObjectId(3), 0.6);

        let truth = PointIndex::new(TRUTH_INDEX_CELL);
        let pieces = vec![
            (Rect::from_coords(50.0, -10.0, 100.0, 10.0), 0.5),
            (Rect::from_coords(100.0, -10.0, 150.0, 10.0), 0.5),
        ];
        let (real, occ) = query_window(g, &truth, &anchors, &pieces);
        assert!(real.is_empty());
        assert_eq!(occ.get(&ObjectId(3)), Some(&0.6));
    }

    #[test]
    fn exact_prediction_scores_one_for_every_window_size() {
        let scenario = Scenario::build(ScenarioKind::Corridor).unwrap();
        let g = &scenario.plan;
        let mut rng = ChaCha8Rng::seed_from_u64(21);

        // One object resting on every node, its whole mass on that node's anchor.
        let mut truth = PointIndex::new(TRUTH_INDEX_CELL);
        let mut anchors = AnchorMap::new();
        for n in 0..g.node_count() {
            let id = ObjectId(n as i64);
            let pos = LandmarkPosition::at_rest(NodeId(n));
            truth.insert(g.position_coordinate(&pos), id);
            anchors.add(g.nearest_anchor(&pos), id, 1.0);
        }

        let sizes = vec![0.01, 0.05, 0.2];
        let mut stats = WindowStatistics::new(sizes.clone(), 0.5);
        for (w, &ratio) in sizes.iter().enumerate() {
            for _ in 0..200 {
                let pieces = g.random_window(ratio, &mut rng);
                let (real, occupancy) = query_window(g, &truth, &anchors, &pieces);
                stats.record(w, &real, &occupancy);
            }
            assert!(stats.samples(w) > 0, "window {ratio} never held an object");
        }

        for metric in Metric::ALL {
            for row in stats.measure(metric) {
                assert_abs_diff_eq!(row.mean, 1.0, epsilon = 1e-12);
                assert_abs_diff_eq!(row.std_dev, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn sweep_scores_stay_in_unit_range() {
        let scenario = Scenario::build(ScenarioKind::Corridor).unwrap();
        let config = small_config(&scenario.config);
        let mut sim = Simulation::new(scenario.plan, config.clone(), 17).unwrap();
        let stats = sim.execute();

        assert_eq!(stats.window_sizes(), config.window_sizes.as_slice());
        let mut any_scored = false;
        for metric in Metric::ALL {
            for row in stats.measure(metric) {
                assert!((0.0..=1.0).contains(&row.mean), "{} mean {}", metric.name(), row.mean);
                assert!(row.std_dev >= 0.0);
                any_scored |= row.samples > 0;
            }
        }
        assert!(any_scored, "20 objects on a corridor fill some windows");
    }

    #[test]
    fn same_seed_same_statistics() {
        let scenario = Scenario::build(ScenarioKind::Corridor).unwrap();
        let config = small_config(&scenario.config);
        let run = |seed| {
            let mut sim = Simulation::new(scenario.plan.clone(), config.clone(), seed).unwrap();
            sim.execute().measure(Metric::F1)
        };
        assert_eq!(run(5), run(5));
    }
}
