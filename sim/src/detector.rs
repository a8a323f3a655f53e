//! Detection sampler.
//!
//! Every object is probed once per whole timestep:
//! - with probability `1 - success_rate` the attempt is a miss
//! - otherwise the reading is the nearest detector covering the object's
//!   position at that timestep, or a miss when none covers it

use floor_model::WalkingGraph;
use inference_core::{Particle, Reading, SimConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectionModel {
    /// Probability that a detection attempt is not dropped
    pub success_rate: f64,
    /// Coverage radius of every detector
    pub radius: f64,
    /// Number of timesteps sampled, `0..timesteps`
    pub timesteps: usize,
}

impl DetectionModel {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            success_rate: config.success_rate,
            radius: config.radius,
            timesteps: config.duration.ceil() as usize,
        }
    }

    /// One fixed-length reading sequence per object, in object order.
    pub fn detect<G, R>(&self, graph: &G, objects: &[Particle], rng: &mut R) -> Vec<Vec<Reading>>
    where
        G: WalkingGraph,
        R: Rng + ?Sized,
    {
        objects
            .iter()
            .map(|object| {
                (0..self.timesteps)
                    .map(|t| {
                        // Miss detection?
                        if rng.gen::<f64>() > self.success_rate {
                            None
                        } else {
                            let pos = object.position_at(graph, t as f64);
                            graph.detector_coverage(&pos, self.radius)
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// Sample readings for `objects` with the detection settings of `config`.
pub fn detect<G, R>(graph: &G, objects: &[Particle], config: &SimConfig, rng: &mut R) -> Vec<Vec<Reading>>
where
    G: WalkingGraph,
    R: Rng + ?Sized,
{
    DetectionModel::from_config(config).detect(graph, objects, rng)
}
