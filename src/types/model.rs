//! TrainedModel: fitted cost regression, holdout metrics and feature importances.

use serde::{Deserialize, Serialize};

/// Holdout (or full-data, when low-confidence) evaluation metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean absolute error on the evaluation rows
    pub mae: f64,
    /// Root mean squared error on the evaluation rows
    pub rmse: f64,
    /// Coefficient of determination; `None` when the evaluation target is constant
    pub r_squared: Option<f64>,
    /// MAE of always predicting the training mean
    pub baseline_mae: f64,
    /// `mae / mean(|target|)` on the evaluation rows
    pub relative_mae: f64,
    pub train_rows: usize,
    pub holdout_rows: usize,
}

/// Contribution of one matrix column to the model's predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub source_column: String,
    /// Normalized importance; all importances of a model sum to 1 (or are all 0)
    pub importance: f64,
}

/// One fitted coefficient together with the standardisation applied to its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCoefficient {
    pub feature: String,
    /// Coefficient on the standardized feature
    pub coefficient: f64,
    pub mean: f64,
    pub scale: f64,
}

/// Immutable result of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub target_column: String,
    pub intercept: f64,
    pub coefficients: Vec<FeatureCoefficient>,
    pub metrics: ModelMetrics,
    /// Sorted by importance descending, ties by feature name
    pub feature_importances: Vec<FeatureImportance>,
    /// Set when no holdout rows were available and the fit was evaluated on its own training data
    pub low_confidence: bool,
    pub seed: u64,
}

impl TrainedModel {
    /// Predict cost for one feature row laid out like the training matrix.
    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c.coefficient * (x - c.mean) / c.scale)
                .sum::<f64>()
    }

    /// Highest-ranked features, at most `n`.
    pub fn top_features(&self, n: usize) -> &[FeatureImportance] {
        &self.feature_importances[..n.min(self.feature_importances.len())]
    }
}
