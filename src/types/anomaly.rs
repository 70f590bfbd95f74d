//! AnomalyReport: per-record structural outlier scores.

use serde::{Deserialize, Serialize};

/// Scoring algorithm used by the anomaly detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyMethod {
    /// Random isolation trees; short average path length means anomalous
    #[default]
    IsolationForest,
    /// Root-mean-square z-score across standardized features
    ZScore,
}

/// Rule that turned scores into flags.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum ThresholdRule {
    /// Flag scores above this percentile (0-100) of all scores
    Percentile(f64),
    /// Flag scores above this absolute value
    Absolute(f64),
}

/// Score and flag for one table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    /// Row index in the source table
    pub row: usize,
    /// Anomaly score in [0, 1]; higher is more unusual
    pub score: f64,
    pub is_anomaly: bool,
}

/// Scores for every record, ranked worst first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub method: AnomalyMethod,
    pub threshold: ThresholdRule,
    /// Effective score cutoff; records strictly above it are flagged
    pub cutoff: f64,
    /// Sorted by score descending, ties by row ascending
    pub records: Vec<AnomalyRecord>,
}

impl AnomalyReport {
    pub fn flagged_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_anomaly).count()
    }

    /// Flagged row indices, worst first.
    pub fn flagged_rows(&self) -> Vec<usize> {
        self.records
            .iter()
            .filter(|r| r.is_anomaly)
            .map(|r| r.row)
            .collect()
    }

    pub fn flagged_fraction(&self) -> f64 {
        if self.records.is_empty() {
            0.0
        } else {
            self.flagged_count() as f64 / self.records.len() as f64
        }
    }

    pub fn score_of(&self, row: usize) -> Option<f64> {
        self.records.iter().find(|r| r.row == row).map(|r| r.score)
    }
}
