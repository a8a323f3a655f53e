//! Window-query accuracy metrics: recall, precision, F1, and their
//! aggregation (mean, standard deviation) per window size.

use crate::types::{ObjectId, Occupancy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which score to report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Recall,
    Precision,
    F1,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Recall, Metric::Precision, Metric::F1];

    fn index(self) -> usize {
        match self {
            Metric::Recall => 0,
            Metric::Precision => 1,
            Metric::F1 => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::Recall => "recall",
            Metric::Precision => "precision",
            Metric::F1 => "f1",
        }
    }

    pub fn score(self, real: &BTreeSet<ObjectId>, predicted: &Occupancy, threshold: f64) -> f64 {
        match self {
            Metric::Recall => recall(real, predicted, threshold),
            Metric::Precision => precision(real, predicted, threshold),
            Metric::F1 => f1_score(real, predicted, threshold),
        }
    }
}

/// (predicted ids that are real, predicted ids) counting only ids with mass ≥ threshold.
fn hits(real: &BTreeSet<ObjectId>, predicted: &Occupancy, threshold: f64) -> (usize, usize) {
    predicted
        .iter()
        .filter(|(_, &mass)| mass >= threshold)
        .fold((0, 0), |(hit, total), (id, _)| {
            (hit + usize::from(real.contains(id)), total + 1)
        })
}

pub fn recall(real: &BTreeSet<ObjectId>, predicted: &Occupancy, threshold: f64) -> f64 {
    if real.is_empty() {
        return 0.0;
    }
    hits(real, predicted, threshold).0 as f64 / real.len() as f64
}

pub fn precision(real: &BTreeSet<ObjectId>, predicted: &Occupancy, threshold: f64) -> f64 {
    if real.is_empty() {
        return 0.0;
    }
    let (hit, total) = hits(real, predicted, threshold);
    if total == 0 {
        0.0
    } else {
        hit as f64 / total as f64
    }
}

/// Harmonic mean of recall and precision.
pub fn f1_from(recall: f64, precision: f64) -> f64 {
    if recall + precision < f64::EPSILON {
        0.0
    } else {
        2.0 * recall * precision / (recall + precision)
    }
}

pub fn f1_score(real: &BTreeSet<ObjectId>, predicted: &Occupancy, threshold: f64) -> f64 {
    f1_from(
        recall(real, predicted, threshold),
        precision(real, predicted, threshold),
    )
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Streaming mean / population variance (Welford).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RunningStats {
    n: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn variance(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            (self.m2 / self.n as f64).max(0.0)
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

/// Aggregated score of one metric at one window size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub window_size: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// Number of scored trials
    pub samples: u64,
}

/// Per-metric, per-window-size accumulators for one sweep.
#[derive(Clone, Debug)]
pub struct WindowStatistics {
    window_sizes: Vec<f64>,
    threshold: f64,
    /// stats[metric][window]
    stats: [Vec<RunningStats>; 3],
}

impl WindowStatistics {
    pub fn new(window_sizes: Vec<f64>, threshold: f64) -> Self {
        let stats = std::array::from_fn(|_| vec![RunningStats::default(); window_sizes.len()]);
        Self {
            window_sizes,
            threshold,
            stats,
        }
    }

    pub fn window_sizes(&self) -> &[f64] {
        &self.window_sizes
    }

    /// Score one trial at window index `window`. Trials whose true set is
    /// empty are not scored; returns whether the trial counted.
    pub fn record(&mut self, window: usize, real: &BTreeSet<ObjectId>, predicted: &Occupancy) -> bool {
        if real.is_empty() {
            return false;
        }
        for metric in Metric::ALL {
            let value = metric.score(real, predicted, self.threshold);
            self.stats[metric.index()][window].push(value);
        }
        true
    }

    /// Scored trials at window index `window`.
    pub fn samples(&self, window: usize) -> u64 {
        self.stats[0][window].count()
    }

    /// (mean, standard deviation) of `metric` for every window size, in order.
    pub fn measure(&self, metric: Metric) -> Vec<MetricSummary> {
        self.window_sizes
            .iter()
            .zip(&self.stats[metric.index()])
            .map(|(&window_size, acc)| MetricSummary {
                window_size,
                mean: acc.mean(),
                std_dev: acc.std_dev(),
                samples: acc.count(),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
