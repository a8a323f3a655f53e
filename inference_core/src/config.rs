//! Simulation parameters.

use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Configuration for one simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of ground-truth objects walking the floor plan
    pub num_objects: usize,
    /// Provisional particles per prediction (N)
    pub num_particles: usize,
    /// Simulated time span; readings exist for timesteps `0..duration`
    pub duration: f64,
    /// Probability that a detection attempt is not a miss
    pub success_rate: f64,
    /// Detector coverage radius (floor-plan units)
    pub radius: f64,
    /// Distinct observations required before a prediction is attempted
    pub min_observations: usize,
    /// Minimum predicted mass for an object to count as inside a window
    pub threshold: f64,
    /// Query timestamps drawn per run
    pub num_timestamps: usize,
    /// Random windows evaluated per timestamp and window size
    pub tests_per_timestamp: usize,
    /// Window sizes as fractions of the total floor area
    pub window_sizes: Vec<f64>,
    /// Earliest query time; earlier times carry too little history
    pub query_time_min: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_objects: 200,
            num_particles: 64,
            duration: 500.0,
            success_rate: 0.8,
            radius: 50.0,
            min_observations: 2,
            threshold: 0.5,
            num_timestamps: 10,
            tests_per_timestamp: 100,
            window_sizes: vec![0.005, 0.01, 0.02, 0.05, 0.1],
            query_time_min: 50.0,
        }
    }
}

impl SimConfig {
    /// Reject configurations that would produce degenerate statistics.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.num_objects == 0 {
            return Err(SimError::config("num_objects", "must be at least 1"));
        }
        if self.num_particles == 0 {
            return Err(SimError::config("num_particles", "must be at least 1"));
        }
        if !(self.duration > 0.0) || !self.duration.is_finite() {
            return Err(SimError::config(
                "duration",
                format!("must be positive, got {}", self.duration),
            ));
        }
        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(SimError::config(
                "success_rate",
                format!("must lie in [0, 1], got {}", self.success_rate),
            ));
        }
        if !(self.radius >= 0.0) || !self.radius.is_finite() {
            return Err(SimError::config(
                "radius",
                format!("must be finite and non-negative, got {}", self.radius),
            ));
        }
        if self.min_observations == 0 {
            return Err(SimError::config("min_observations", "must be at least 1"));
        }
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(SimError::config(
                "threshold",
                format!("must lie in (0, 1], got {}", self.threshold),
            ));
        }
        if self.num_timestamps == 0 || self.tests_per_timestamp == 0 {
            return Err(SimError::config(
                "num_timestamps",
                "timestamps and tests per timestamp must be at least 1",
            ));
        }
        if self.window_sizes.is_empty() {
            return Err(SimError::config("window_sizes", "must not be empty"));
        }
        if let Some(bad) = self
            .window_sizes
            .iter()
            .find(|&&r| !(r > 0.0 && r <= 1.0))
        {
            return Err(SimError::config(
                "window_sizes",
                format!("ratios must lie in (0, 1], got {bad}"),
            ));
        }
        if !(self.query_time_min >= 0.0 && self.query_time_min < self.duration) {
            return Err(SimError::config(
                "query_time_min",
                format!(
                    "must lie in [0, duration = {}), got {}",
                    self.duration, self.query_time_min
                ),
            ));
        }
        Ok(())
    }
}
