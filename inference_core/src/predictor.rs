//! Filter-resample reconstruction of an object's position at a query time.
//!
//! # Processing steps per object
//! 1. Walk back from `floor(t)` until `min_observations` distinct detections
//!    are found; that index is the start of the evidence window.
//! 2. Seed `num_particles` provisional particles at random points inside the
//!    starting detector's coverage.
//! 3. Step all of them one time unit per reading, dropping every particle that
//!    a non-miss reading contradicts, and refill the population by uniform
//!    resampling of the survivors.
//! 4. Advance the survivors over the fractional remainder of `t`.
//! 5. Snap every survivor to its nearest anchor with mass `1 / N`.

use crate::config::SimConfig;
use crate::error::PredictFailure;
use crate::particle::Particle;
use crate::types::{AnchorMap, ObjectId, Reading};
use floor_model::{DetectorId, LandmarkPosition, WalkingGraph};
use rand::Rng;
use tracing::trace;

#[derive(Clone, Debug)]
pub struct Predictor {
    /// Population size N.
    pub num_particles: usize,
    /// Distinct detections required before the query time.
    pub min_observations: usize,
    /// Detector coverage radius used when checking consistency.
    pub radius: f64,
}

impl Predictor {
    pub fn new(num_particles: usize, min_observations: usize, radius: f64) -> Self {
        Self {
            num_particles,
            min_observations,
            radius,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.num_particles, config.min_observations, config.radius)
    }

    /// Reconstruct where `object` is at `query_time` from its `readings` and
    /// add the resulting mass to `anchors`.
    ///
    /// Returns the number of surviving particles. On failure `anchors` is left
    /// untouched.
    pub fn predict<G, R>(
        &self,
        graph: &G,
        object: ObjectId,
        readings: &[Reading],
        query_time: f64,
        anchors: &mut AnchorMap,
        rng: &mut R,
    ) -> Result<usize, PredictFailure>
    where
        G: WalkingGraph,
        R: Rng + ?Sized,
    {
        let required = self.min_observations.max(1);
        if query_time < 0.0 {
            return Err(PredictFailure::InsufficientEvidence { found: 0, required });
        }
        let end = query_time.floor() as usize;

        let start = evidence_start(readings, end, required)
            .map_err(|found| PredictFailure::InsufficientEvidence { found, required })?;

        // evidence_start only stops on a detection.
        let Some(Some(first)) = readings.get(start).copied() else {
            return Err(PredictFailure::InsufficientEvidence { found: 0, required });
        };
        let seed = graph
            .detector_position(first)
            .ok_or(PredictFailure::UnknownDetector(first))?;

        let n = self.num_particles.max(1);
        let mut population: Vec<Particle> = (0..n)
            .map(|_| {
                let start = spread_inside_coverage(graph, object, seed, first, self.radius, rng);
                Particle::new(graph, object, Some(start), rng)
            })
            .collect();

        for step in start + 1..=end {
            let reading = readings.get(step).copied().flatten();
            population.retain_mut(|p| {
                let pos = p.advance(graph, None, rng);
                match reading {
                    Some(detector) => graph.covered_by(&pos, self.radius, detector),
                    None => true,
                }
            });

            if population.is_empty() {
                trace!(%object, step, "filter collapse");
                return Err(PredictFailure::FilterCollapse { step });
            }
            refill(&mut population, n, rng);
        }

        // During the remainder the object is unobserved: this is the prediction.
        let remain = query_time - end as f64;
        let mass = 1.0 / population.len() as f64;
        for p in &mut population {
            let pos = if remain > 0.0 {
                p.advance(graph, Some(remain), rng)
            } else {
                p.position()
            };
            anchors.add(graph.nearest_anchor(&pos), object, mass);
        }

        Ok(population.len())
    }
}

/// Earliest index `start ≤ end` such that `readings[start..=end]` holds
/// `required` distinct consecutive detections. A detection equal to the one
/// counted just before it is not new. `Err` carries the count found.
pub fn evidence_start(readings: &[Reading], end: usize, required: usize) -> Result<usize, usize> {
    let mut last = None;
    let mut count = 0;
    for i in (0..=end).rev() {
        if let Some(&Some(detector)) = readings.get(i) {
            if last != Some(detector) {
                count += 1;
                last = Some(detector);
                if count >= required {
                    return Ok(i);
                }
            }
        }
    }
    Err(count)
}

/// Random position reached by walking up to `radius` from `seed`, kept only
/// if `detector` still covers it; otherwise `seed` itself.
fn spread_inside_coverage<G, R>(
    graph: &G,
    object: ObjectId,
    seed: LandmarkPosition,
    detector: DetectorId,
    radius: f64,
    rng: &mut R,
) -> LandmarkPosition
where
    G: WalkingGraph,
    R: Rng + ?Sized,
{
    let reach = rng.gen::<f64>() * radius;
    if !(reach > 0.0) || !reach.is_finite() {
        return seed;
    }
    let mut walker = Particle::new(graph, object, Some(seed), rng);
    let duration = reach / walker.velocity();
    let pos = walker.advance(graph, Some(duration), rng);
    if graph.covered_by(&pos, radius, detector) {
        pos
    } else {
        seed
    }
}

/// Grow `population` back to `target` by drawing uniformly, with replacement,
/// from the particles currently in it. Draws are exact clones.
pub fn refill<R: Rng + ?Sized>(population: &mut Vec<Particle>, target: usize, rng: &mut R) {
    let survivors = population.len();
    if survivors == 0 || survivors >= target {
        return;
    }
    for _ in survivors..target {
        let twin = population[rng.gen_range(0..survivors)].clone();
        population.push(twin);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
