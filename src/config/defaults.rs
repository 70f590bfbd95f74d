//! Default values for every tunable in `AnalysisConfig`.
//!
//! Grouped by pipeline stage. `AnalysisConfig::default()` is built from these,
//! and each field's `#[serde(default = ...)]` points back here.

// ============================================================================
// Column Classifier
// ============================================================================

/// Non-null values inspected per column when checking value types.
pub const CLASSIFIER_SAMPLE_SIZE: usize = 1_000;

// ============================================================================
// Feature Builder
// ============================================================================

/// Categorical columns with more distinct levels than this are frequency-encoded
/// even when one-hot encoding is selected.
pub const MAX_ONE_HOT_LEVELS: usize = 20;

/// Sentinel level for missing categorical values.
pub const UNKNOWN_CATEGORY: &str = "unknown";

// ============================================================================
// Model Trainer
// ============================================================================

/// Fraction of rows withheld for evaluation.
pub const HOLDOUT_RATIO: f64 = 0.2;

/// Seed for the train/holdout shuffle, permutation importance and isolation trees.
pub const RANDOM_SEED: u64 = 42;

/// Absolute row floor below which no model is fitted.
pub const MIN_ROWS: usize = 10;

/// Ridge penalty on standardized coefficients.
pub const RIDGE_LAMBDA: f64 = 1.0;

/// Shuffles per feature when estimating permutation importance.
pub const PERMUTATION_REPEATS: usize = 5;

// ============================================================================
// Anomaly Detector
// ============================================================================

/// Records scoring above this percentile of all scores are flagged.
///
/// 90 matches a 10% contamination assumption.
pub const ANOMALY_THRESHOLD_PERCENTILE: f64 = 90.0;

/// Trees in the isolation forest.
pub const ISOLATION_TREES: usize = 100;

/// Rows sampled per isolation tree.
pub const ISOLATION_SUBSAMPLE: usize = 256;

// ============================================================================
// Insight Synthesizer
// ============================================================================

/// Features named by the top-features insight.
pub const TOP_N_FEATURES: usize = 3;

/// Relative MAE above which the model-reliability warning fires.
pub const MAX_RELATIVE_ERROR: f64 = 0.25;

/// Share of severe records above which the anomaly insight turns critical.
pub const CRITICAL_ANOMALY_FRACTION: f64 = 0.05;

/// Absolute anomaly score a flagged record must exceed to count as severe.
///
/// Isolation-forest scores near 0.5 are ordinary.
pub const CRITICAL_ANOMALY_SCORE: f64 = 0.7;

/// Identifiers listed in the critical anomaly insight.
pub const MAX_FLAGGED_IDENTIFIERS: usize = 5;

/// Holdout rows below which metrics are considered unreliable.
pub const MIN_RELIABLE_HOLDOUT: usize = 5;

/// Missing-cell share above which the imputation warning fires.
pub const MAX_IMPUTED_FRACTION: f64 = 0.10;

/// Share of total cost held by one category above which concentration is a warning.
pub const COST_CONCENTRATION_WARNING: f64 = 0.5;

/// Latest-month increase over the prior monthly mean that triggers the trend warning.
pub const COST_TREND_WARNING: f64 = 0.25;
