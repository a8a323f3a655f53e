//! One simulation invocation: ground-truth trajectories → detections →
//! windowed inference statistics.
//!
//! The simulation owns the single random source for the run. It is seeded
//! once in [`Simulation::new`] and every stage draws from it in order.

use crate::detector::DetectionModel;
use crate::range_query::range_query_windowsize;
use floor_model::WalkingGraph;
use inference_core::{ObjectId, Particle, Reading, SimConfig, SimError, WindowStatistics};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

pub struct Simulation<G: WalkingGraph> {
    graph: G,
    config: SimConfig,
    objects: Vec<Particle>,
    readings: Vec<Vec<Reading>>,
    rng: ChaCha8Rng,
}

impl<G: WalkingGraph> Simulation<G> {
    pub fn new(graph: G, config: SimConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            graph,
            config,
            objects: Vec::new(),
            readings: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn objects(&self) -> &[Particle] {
        &self.objects
    }

    pub fn readings(&self) -> &[Vec<Reading>] {
        &self.readings
    }

    /// Place `num_objects` objects at random and walk them, one unit step at
    /// a time, until the end of the simulated duration.
    pub fn run(&mut self) {
        let graph = &self.graph;
        let rng = &mut self.rng;

        self.objects = (0..self.config.num_objects)
            .map(|i| Particle::new(graph, ObjectId(i as i64), None, rng))
            .collect();

        let ticks = self.config.duration.ceil() as usize;
        for _ in 0..ticks {
            for object in &mut self.objects {
                object.advance(graph, None, rng);
            }
        }

        let events: usize = self.objects.iter().map(|o| o.history().len()).sum();
        info!(objects = self.objects.len(), ticks, events, "trajectories generated");
    }

    /// Sample readings for every object.
    pub fn detect(&mut self) {
        let model = DetectionModel::from_config(&self.config);
        self.readings = model.detect(&self.graph, &self.objects, &mut self.rng);

        let hits: usize = self
            .readings
            .iter()
            .map(|r| r.iter().filter(|x| x.is_some()).count())
            .sum();
        info!(
            timesteps = model.timesteps,
            detections = hits,
            "readings sampled"
        );
    }

    /// Windowed statistics sweep over the current objects and readings.
    pub fn range_query_windowsize(&mut self) -> WindowStatistics {
        let stats = range_query_windowsize(
            &self.graph,
            &self.objects,
            &self.readings,
            &self.config,
            &mut self.rng,
        );
        info!(
            windows = stats.window_sizes().len(),
            timestamps = self.config.num_timestamps,
            "range query sweep done"
        );
        stats
    }

    /// Full pipeline: trajectories, detections, sweep.
    pub fn execute(&mut self) -> WindowStatistics {
        self.run();
        self.detect();
        self.range_query_windowsize()
    }
}
