//! Anomaly Detector
//!
//! Scores every record by how structurally unusual its feature vector is,
//! independent of the cost target. Features are z-score standardized over all
//! rows before scoring.
//!
//! ## Methods
//! - `IsolationForest`: average path length over random isolation trees,
//!   score `2^(-E[h(x)] / c(psi))` in (0, 1]
//! - `ZScore`: root-mean-square z-score `r`, score `r / (1 + r)` in [0, 1)
//!
//! Records scoring strictly above the cutoff are flagged. The cutoff is either
//! an absolute score or a percentile of all scores, so raising the threshold
//! never flags more records.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::stats;
use crate::config::AnomalyConfig;
use crate::types::{AnomalyMethod, AnomalyRecord, AnomalyReport, FeatureMatrix, ThresholdRule};

/// Euler-Mascheroni constant
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

pub struct AnomalyDetector;

impl AnomalyDetector {
    /// Score and flag every row of the matrix. Deterministic for a given seed.
    pub fn detect(matrix: &FeatureMatrix, config: &AnomalyConfig, seed: u64) -> AnomalyReport {
        let standardized = standardize(&matrix.data);

        let scores = match config.method {
            AnomalyMethod::IsolationForest => {
                IsolationForest::fit(&standardized, config.n_trees, config.subsample_size, seed)
                    .score_all(&standardized)
            }
            AnomalyMethod::ZScore => standardized.iter().map(|row| zscore_score(row)).collect(),
        };

        let threshold = config.threshold_rule();
        let cutoff = match threshold {
            ThresholdRule::Absolute(t) => t,
            ThresholdRule::Percentile(p) => stats::quantile(&scores, p / 100.0).unwrap_or(1.0),
        };

        let mut records: Vec<AnomalyRecord> = scores
            .iter()
            .enumerate()
            .map(|(row, &score)| AnomalyRecord {
                row,
                score,
                is_anomaly: score > cutoff,
            })
            .collect();
        records.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.row.cmp(&b.row)));

        let report = AnomalyReport {
            method: config.method,
            threshold,
            cutoff,
            records,
        };
        info!(
            method = ?report.method,
            rows = report.records.len(),
            flagged = report.flagged_count(),
            cutoff = report.cutoff,
            "Anomaly detection complete"
        );
        report
    }
}

/// Z-score every column over all rows. Constant columns become all zeros.
fn standardize(data: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let p = data.first().map_or(0, Vec::len);
    let params: Vec<(f64, f64)> = (0..p)
        .map(|j| {
            let column: Vec<f64> = data.iter().map(|row| row[j]).collect();
            let std = stats::population_std(&column);
            (stats::mean(&column), if std > 0.0 { std } else { 1.0 })
        })
        .collect();

    data.iter()
        .map(|row| {
            row.iter()
                .zip(&params)
                .map(|(x, (mean, std))| (x - mean) / std)
                .collect()
        })
        .collect()
}

fn zscore_score(row: &[f64]) -> f64 {
    if row.is_empty() {
        return 0.0;
    }
    let rms = (row.iter().map(|z| z * z).sum::<f64>() / row.len() as f64).sqrt();
    rms / (1.0 + rms)
}

/// Average path length of an unsuccessful BST search among `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn path_length(&self, row: &[f64], depth: f64) -> f64 {
        match self {
            Node::Leaf { size } => depth + average_path_length(*size),
            Node::Split {
                feature,
                value,
                left,
                right,
            } => {
                if row[*feature] < *value {
                    left.path_length(row, depth + 1.0)
                } else {
                    right.path_length(row, depth + 1.0)
                }
            }
        }
    }
}

struct IsolationForest {
    trees: Vec<Node>,
    subsample: usize,
}

impl IsolationForest {
    fn fit(data: &[Vec<f64>], n_trees: usize, subsample_size: usize, seed: u64) -> Self {
        let n = data.len();
        let subsample = subsample_size.min(n);
        let max_depth = (subsample.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(seed);

        let trees = if n == 0 {
            Vec::new()
        } else {
            (0..n_trees)
                .map(|_| {
                    let rows = index::sample(&mut rng, n, subsample).into_vec();
                    Self::grow(data, rows, 0, max_depth, &mut rng)
                })
                .collect()
        };
        debug!(trees = trees.len(), subsample, max_depth, "Isolation forest grown");

        Self { trees, subsample }
    }

    fn grow(
        data: &[Vec<f64>],
        rows: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> Node {
        if depth >= max_depth || rows.len() <= 1 {
            return Node::Leaf { size: rows.len() };
        }

        // Only features that still vary within this node can split it
        let p = data[rows[0]].len();
        let splittable: Vec<(usize, f64, f64)> = (0..p)
            .filter_map(|j| {
                let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                    (lo.min(data[r][j]), hi.max(data[r][j]))
                });
                (hi > lo).then_some((j, lo, hi))
            })
            .collect();
        if splittable.is_empty() {
            return Node::Leaf { size: rows.len() };
        }

        let (feature, lo, hi) = splittable[rng.gen_range(0..splittable.len())];
        let value = rng.gen_range(lo..hi);
        let (left, right): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| data[r][feature] < value);

        Node::Split {
            feature,
            value,
            left: Box::new(Self::grow(data, left, depth + 1, max_depth, rng)),
            right: Box::new(Self::grow(data, right, depth + 1, max_depth, rng)),
        }
    }

    fn score_all(&self, data: &[Vec<f64>]) -> Vec<f64> {
        let normalizer = average_path_length(self.subsample);
        data.iter()
            .map(|row| {
                if self.trees.is_empty() || normalizer <= 0.0 {
                    return 0.5;
                }
                let mean_path = self
                    .trees
                    .iter()
                    .map(|tree| tree.path_length(row, 0.0))
                    .sum::<f64>()
                    / self.trees.len() as f64;
                2f64.powf(-mean_path / normalizer)
            })
            .collect()
    }
}
