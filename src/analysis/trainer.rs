//! Model Trainer
//!
//! Fits a ridge regression of the cost target on the feature matrix and
//! measures it on a seeded holdout partition.
//!
//! ## Process
//! 1. Refuse tables below the row floor
//! 2. Shuffle row indices with `StdRng::seed_from_u64(seed)` and cut a holdout
//!    of `ceil(rows * holdout_ratio)` rows
//! 3. Fit on the training rows (see `regression`)
//! 4. Score MAE / RMSE / R² on the holdout
//! 5. Rank features by permutation importance on the holdout
//!
//! When the holdout would be empty, or would swallow every row, the model is
//! fitted and evaluated on all rows and marked `low_confidence`.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::regression::{fit_ridge, RidgeFit};
use super::stats;
use crate::config::ModelConfig;
use crate::error::AnalysisError;
use crate::types::{
    FeatureCoefficient, FeatureImportance, FeatureMatrix, ModelMetrics, TrainedModel,
};

/// Added to the model seed to derive the permutation RNG seed.
const PERMUTATION_SEED_OFFSET: u64 = 0x9E37_79B9;

/// Row partition used for one training run.
#[derive(Debug, Clone, PartialEq)]
struct Split {
    train: Vec<usize>,
    holdout: Vec<usize>,
    /// True when `holdout` is the training set itself
    reused: bool,
}

pub struct ModelTrainer;

impl ModelTrainer {
    /// Train a cost model. Deterministic for a given matrix and config.
    pub fn train(
        matrix: &FeatureMatrix,
        config: &ModelConfig,
    ) -> Result<TrainedModel, AnalysisError> {
        let rows = matrix.rows();
        if rows < config.min_rows {
            warn!(rows, required = config.min_rows, "Too few rows to train");
            return Err(AnalysisError::InsufficientData {
                rows,
                required: config.min_rows,
            });
        }

        let split = Self::split(rows, config.holdout_ratio, config.seed);
        if split.reused {
            warn!(
                rows,
                holdout_ratio = config.holdout_ratio,
                "Holdout unavailable, evaluating on training rows (low confidence)"
            );
        }
        debug!(
            train = split.train.len(),
            holdout = split.holdout.len(),
            seed = config.seed,
            "Partitioned rows"
        );

        let fit = fit_ridge(&matrix.data, &matrix.target, &split.train, config.ridge_lambda)
            .map_err(|failure| AnalysisError::ModelFit {
                reason: failure.to_string(),
                features: matrix.feature_names(),
            })?;

        let metrics = Self::evaluate(matrix, &fit, &split);
        let feature_importances = Self::permutation_importance(matrix, &fit, &split.holdout, config);

        let coefficients = matrix
            .features
            .iter()
            .enumerate()
            .map(|(j, f)| FeatureCoefficient {
                feature: f.name.clone(),
                coefficient: fit.coefficients[j],
                mean: fit.means[j],
                scale: fit.scales[j],
            })
            .collect();

        info!(
            target = %matrix.target_column,
            features = matrix.feature_count(),
            mae = metrics.mae,
            relative_mae = metrics.relative_mae,
            r_squared = ?metrics.r_squared,
            low_confidence = split.reused,
            "Model trained"
        );

        Ok(TrainedModel {
            target_column: matrix.target_column.clone(),
            intercept: fit.intercept,
            coefficients,
            metrics,
            feature_importances,
            low_confidence: split.reused,
            seed: config.seed,
        })
    }

    fn split(rows: usize, holdout_ratio: f64, seed: u64) -> Split {
        let holdout_len = (rows as f64 * holdout_ratio).ceil() as usize;
        let all: Vec<usize> = (0..rows).collect();
        if holdout_len == 0 || holdout_len >= rows {
            return Split {
                train: all.clone(),
                holdout: all,
                reused: true,
            };
        }

        let mut shuffled = all;
        let mut rng = StdRng::seed_from_u64(seed);
        shuffled.shuffle(&mut rng);
        let train = shuffled.split_off(holdout_len);
        Split {
            train,
            holdout: shuffled,
            reused: false,
        }
    }

    fn evaluate(matrix: &FeatureMatrix, fit: &RidgeFit, split: &Split) -> ModelMetrics {
        let actual: Vec<f64> = split.holdout.iter().map(|&r| matrix.target[r]).collect();
        let predicted: Vec<f64> = split
            .holdout
            .iter()
            .map(|&r| fit.predict(&matrix.data[r]))
            .collect();
        let baseline = vec![fit.intercept; actual.len()];

        let mae = stats::mean_absolute_error(&actual, &predicted);
        let mean_abs = actual.iter().map(|a| a.abs()).sum::<f64>() / actual.len().max(1) as f64;
        let relative_mae = if mean_abs > 0.0 { mae / mean_abs } else { 0.0 };

        ModelMetrics {
            mae,
            rmse: stats::root_mean_squared_error(&actual, &predicted),
            r_squared: stats::r_squared(&actual, &predicted),
            baseline_mae: stats::mean_absolute_error(&actual, &baseline),
            relative_mae,
            train_rows: split.train.len(),
            holdout_rows: if split.reused { 0 } else { split.holdout.len() },
        }
    }

    /// Mean increase in holdout MAE when one feature's values are shuffled.
    fn permutation_importance(
        matrix: &FeatureMatrix,
        fit: &RidgeFit,
        eval_rows: &[usize],
        config: &ModelConfig,
    ) -> Vec<FeatureImportance> {
        let actual: Vec<f64> = eval_rows.iter().map(|&r| matrix.target[r]).collect();
        let mut rows: Vec<Vec<f64>> = eval_rows.iter().map(|&r| matrix.data[r].clone()).collect();
        let base_mae = Self::mae_of(fit, &rows, &actual);

        let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(PERMUTATION_SEED_OFFSET));
        let repeats = config.permutation_repeats.max(1);

        let mut raw: Vec<f64> = Vec::with_capacity(matrix.feature_count());
        for j in 0..matrix.feature_count() {
            let original: Vec<f64> = rows.iter().map(|r| r[j]).collect();
            let mut total_increase = 0.0;
            for _ in 0..repeats {
                let mut permuted = original.clone();
                permuted.shuffle(&mut rng);
                for (row, v) in rows.iter_mut().zip(&permuted) {
                    row[j] = *v;
                }
                total_increase += Self::mae_of(fit, &rows, &actual) - base_mae;
            }
            for (row, v) in rows.iter_mut().zip(&original) {
                row[j] = *v;
            }
            raw.push((total_increase / repeats as f64).max(0.0));
        }

        if raw.iter().all(|v| *v <= 0.0) {
            debug!("Permutation importances all zero, using coefficient magnitudes");
            raw = fit.coefficients.iter().map(|c| c.abs()).collect();
        }
        let total: f64 = raw.iter().sum();

        let mut importances: Vec<FeatureImportance> = matrix
            .features
            .iter()
            .zip(&raw)
            .map(|(f, v)| FeatureImportance {
                feature: f.name.clone(),
                source_column: f.source_column.clone(),
                importance: if total > 0.0 { v / total } else { 0.0 },
            })
            .collect();
        importances.sort_by(|a, b| {
            b.importance
                .total_cmp(&a.importance)
                .then_with(|| a.feature.cmp(&b.feature))
        });
        importances
    }

    fn mae_of(fit: &RidgeFit, rows: &[Vec<f64>], actual: &[f64]) -> f64 {
        let predicted: Vec<f64> = rows.iter().map(|r| fit.predict(r)).collect();
        stats::mean_absolute_error(actual, &predicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FeatureColumn, FeatureKind};

    /// cost = 40 * hours + 5 * (id % 3) + 100, plus a nuisance column
    fn matrix(rows: usize) -> FeatureMatrix {
        let data: Vec<Vec<f64>> = (0..rows)
            .map(|i| {
                vec![
                    (i % 7) as f64 + 1.0,
                    (i % 3) as f64,
                    ((i * 13) % 5) as f64,
                ]
            })
            .collect();
        let target = data
            .iter()
            .map(|r| 40.0 * r[0] + 5.0 * r[1] + 100.0)
            .collect();
        let feature = |name: &str| FeatureColumn {
            name: name.to_string(),
            source_column: name.to_string(),
            kind: FeatureKind::Numeric,
        };
        FeatureMatrix {
            features: vec![feature("labor_hours"), feature("shift"), feature("noise")],
            data,
            target,
            target_column: "maintenance_cost".to_string(),
            excluded: vec![],
            imputed_cells: 0,
        }
    }

    fn config() -> ModelConfig {
        ModelConfig {
            ridge_lambda: 0.01,
            ..ModelConfig::default()
        }
    }

    #[test]
    fn test_rejects_below_row_floor() {
        let err = ModelTrainer::train(&matrix(5), &ModelConfig::default()).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                rows: 5,
                required: 10
            }
        );
    }

    #[test]
    fn test_holdout_partition_sizes() {
        let model = ModelTrainer::train(&matrix(50), &config()).unwrap();
        assert_eq!(model.metrics.holdout_rows, 10);
        assert_eq!(model.metrics.train_rows, 40);
        assert!(!model.low_confidence);
    }

    #[test]
    fn test_split_covers_every_row_once() {
        let split = ModelTrainer::split(23, 0.2, 7);
        let mut all: Vec<usize> = split.train.iter().chain(&split.holdout).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..23).collect::<Vec<_>>());
        assert_eq!(split.holdout.len(), 5);
    }

    #[test]
    fn test_zero_holdout_is_low_confidence() {
        let cfg = ModelConfig {
            holdout_ratio: 0.0,
            ..config()
        };
        let model = ModelTrainer::train(&matrix(20), &cfg).unwrap();
        assert!(model.low_confidence);
        assert_eq!(model.metrics.holdout_rows, 0);
        assert_eq!(model.metrics.train_rows, 20);
    }

    #[test]
    fn test_fits_linear_cost() {
        let m = matrix(60);
        let model = ModelTrainer::train(&m, &config()).unwrap();
        assert!(model.metrics.mae < 1.0, "mae = {}", model.metrics.mae);
        assert!(model.metrics.mae < model.metrics.baseline_mae);
        assert!(model.metrics.r_squared.unwrap() > 0.99);
        assert!((model.predict(&m.data[3]) - m.target[3]).abs() < 2.0);
    }

    #[test]
    fn test_importances_rank_driver_first() {
        let model = ModelTrainer::train(&matrix(60), &config()).unwrap();
        assert_eq!(model.feature_importances.len(), 3);
        assert_eq!(model.feature_importances[0].feature, "labor_hours");
        let total: f64 = model.feature_importances.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(model.feature_importances.iter().all(|f| f.importance >= 0.0));
    }

    #[test]
    fn test_training_is_reproducible() {
        let m = matrix(40);
        let a = ModelTrainer::train(&m, &config()).unwrap();
        let b = ModelTrainer::train(&m, &config()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_singular_system_is_model_fit_error() {
        let mut m = matrix(30);
        for row in &mut m.data {
            row[2] = row[0] * 2.0;
        }
        let cfg = ModelConfig {
            ridge_lambda: 0.0,
            ..ModelConfig::default()
        };
        match ModelTrainer::train(&m, &cfg).unwrap_err() {
            AnalysisError::ModelFit { features, .. } => {
                assert_eq!(features, vec!["labor_hours", "shift", "noise"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
