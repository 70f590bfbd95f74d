//! Analysis Configuration - every pipeline tunable as an overridable TOML value
//!
//! Each section implements `Default` with the values from `defaults.rs`, so a
//! missing file, a missing section or a missing key all fall back to the
//! documented defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::types::{AnomalyMethod, ThresholdRule};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "MAINT_ANALYSIS_CONFIG";

/// Config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "analysis.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one analysis invocation.
///
/// Passed explicitly into the pipeline; there is no process-wide instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Column role inference
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Feature matrix construction
    #[serde(default)]
    pub features: FeatureConfig,

    /// Regression training and evaluation
    #[serde(default)]
    pub model: ModelConfig,

    /// Structural outlier scoring
    #[serde(default)]
    pub anomaly: AnomalyConfig,

    /// Insight rule thresholds
    #[serde(default)]
    pub insights: InsightConfig,
}

impl AnalysisConfig {
    /// Load configuration using the standard search order:
    /// 1. `$MAINT_ANALYSIS_CONFIG` environment variable
    /// 2. `./analysis.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded analysis config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded analysis config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No analysis config found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys are logged as warnings.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check every value for range violations, collecting all of them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let m = &self.model;
        if !m.holdout_ratio.is_finite() || !(0.0..1.0).contains(&m.holdout_ratio) {
            errors.push(format!(
                "model.holdout_ratio = {} must be in [0, 1)",
                m.holdout_ratio
            ));
        }
        if m.min_rows < 2 {
            errors.push(format!("model.min_rows = {} must be >= 2", m.min_rows));
        }
        if !m.ridge_lambda.is_finite() || m.ridge_lambda < 0.0 {
            errors.push(format!(
                "model.ridge_lambda = {} must be finite and >= 0",
                m.ridge_lambda
            ));
        }
        if m.permutation_repeats == 0 {
            errors.push("model.permutation_repeats must be > 0".to_string());
        }

        let a = &self.anomaly;
        if !a.threshold_percentile.is_finite() || !(0.0..=100.0).contains(&a.threshold_percentile) {
            errors.push(format!(
                "anomaly.threshold_percentile = {} must be in [0, 100]",
                a.threshold_percentile
            ));
        }
        if let Some(t) = a.score_threshold {
            if !t.is_finite() || !(0.0..=1.0).contains(&t) {
                errors.push(format!("anomaly.score_threshold = {t} must be in [0, 1]"));
            }
        }
        if a.n_trees == 0 {
            errors.push("anomaly.n_trees must be > 0".to_string());
        }
        if a.subsample_size < 2 {
            errors.push(format!(
                "anomaly.subsample_size = {} must be >= 2",
                a.subsample_size
            ));
        }

        if self.classifier.sample_size == 0 {
            errors.push("classifier.sample_size must be > 0".to_string());
        }
        if self.features.max_one_hot_levels == 0 {
            errors.push("features.max_one_hot_levels must be > 0".to_string());
        }

        let i = &self.insights;
        if i.top_n_features == 0 {
            errors.push("insights.top_n_features must be > 0".to_string());
        }
        for (name, value) in [
            ("insights.max_relative_error", i.max_relative_error),
            ("insights.critical_anomaly_fraction", i.critical_anomaly_fraction),
            ("insights.max_imputed_fraction", i.max_imputed_fraction),
            ("insights.cost_concentration_warning", i.cost_concentration_warning),
            ("insights.cost_trend_warning", i.cost_trend_warning),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(format!("{name} = {value} must be finite and >= 0"));
            }
        }
        if !i.critical_anomaly_score.is_finite() || !(0.0..=1.0).contains(&i.critical_anomaly_score) {
            errors.push(format!(
                "insights.critical_anomaly_score = {} must be in [0, 1]",
                i.critical_anomaly_score
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Classifier Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Non-null values inspected per column for value-type checks.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

fn default_sample_size() -> usize { defaults::CLASSIFIER_SAMPLE_SIZE }

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
        }
    }
}

// ============================================================================
// Feature Config
// ============================================================================

/// Encoding for `CategoricalKey` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalEncoding {
    /// One indicator column per level
    #[default]
    OneHot,
    /// A single column holding the level's share of rows
    Frequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default)]
    pub categorical_encoding: CategoricalEncoding,

    /// Above this many levels a categorical column is frequency-encoded.
    #[serde(default = "default_max_one_hot_levels")]
    pub max_one_hot_levels: usize,
}

fn default_max_one_hot_levels() -> usize { defaults::MAX_ONE_HOT_LEVELS }

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            categorical_encoding: CategoricalEncoding::default(),
            max_one_hot_levels: default_max_one_hot_levels(),
        }
    }
}

// ============================================================================
// Model Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Fraction of rows withheld for evaluation, in [0, 1).
    #[serde(default = "default_holdout_ratio")]
    pub holdout_ratio: f64,

    /// Seed shared by every stochastic step of one invocation.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Tables with fewer rows fail with `InsufficientData`.
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,

    /// Ridge penalty; 0 gives ordinary least squares.
    #[serde(default = "default_ridge_lambda")]
    pub ridge_lambda: f64,

    #[serde(default = "default_permutation_repeats")]
    pub permutation_repeats: usize,
}

fn default_holdout_ratio() -> f64 { defaults::HOLDOUT_RATIO }
fn default_seed() -> u64 { defaults::RANDOM_SEED }
fn default_min_rows() -> usize { defaults::MIN_ROWS }
fn default_ridge_lambda() -> f64 { defaults::RIDGE_LAMBDA }
fn default_permutation_repeats() -> usize { defaults::PERMUTATION_REPEATS }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            holdout_ratio: default_holdout_ratio(),
            seed: default_seed(),
            min_rows: default_min_rows(),
            ridge_lambda: default_ridge_lambda(),
            permutation_repeats: default_permutation_repeats(),
        }
    }
}

// ============================================================================
// Anomaly Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    #[serde(default)]
    pub method: AnomalyMethod,

    /// Flag records scoring above this percentile (0-100) of all scores.
    #[serde(default = "default_threshold_percentile")]
    pub threshold_percentile: f64,

    /// Absolute score cutoff in [0, 1]; takes precedence over the percentile when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f64>,

    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    #[serde(default = "default_subsample_size")]
    pub subsample_size: usize,
}

fn default_threshold_percentile() -> f64 { defaults::ANOMALY_THRESHOLD_PERCENTILE }
fn default_n_trees() -> usize { defaults::ISOLATION_TREES }
fn default_subsample_size() -> usize { defaults::ISOLATION_SUBSAMPLE }

impl AnomalyConfig {
    /// The flagging rule these settings describe.
    pub fn threshold_rule(&self) -> ThresholdRule {
        self.score_threshold
            .map_or(ThresholdRule::Percentile(self.threshold_percentile), ThresholdRule::Absolute)
    }
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            method: AnomalyMethod::default(),
            threshold_percentile: default_threshold_percentile(),
            score_threshold: None,
            n_trees: default_n_trees(),
            subsample_size: default_subsample_size(),
        }
    }
}

// ============================================================================
// Insight Config
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightConfig {
    #[serde(default = "default_top_n_features")]
    pub top_n_features: usize,

    #[serde(default = "default_max_relative_error")]
    pub max_relative_error: f64,

    /// Share of records that must be severe for a critical anomaly insight
    #[serde(default = "default_critical_anomaly_fraction")]
    pub critical_anomaly_fraction: f64,

    /// Score a flagged record must exceed to count as severe, in [0, 1]
    #[serde(default = "default_critical_anomaly_score")]
    pub critical_anomaly_score: f64,

    #[serde(default = "default_max_flagged_identifiers")]
    pub max_flagged_identifiers: usize,

    #[serde(default = "default_min_reliable_holdout")]
    pub min_reliable_holdout: usize,

    #[serde(default = "default_max_imputed_fraction")]
    pub max_imputed_fraction: f64,

    #[serde(default = "default_cost_concentration_warning")]
    pub cost_concentration_warning: f64,

    #[serde(default = "default_cost_trend_warning")]
    pub cost_trend_warning: f64,
}

fn default_top_n_features() -> usize { defaults::TOP_N_FEATURES }
fn default_max_relative_error() -> f64 { defaults::MAX_RELATIVE_ERROR }
fn default_critical_anomaly_fraction() -> f64 { defaults::CRITICAL_ANOMALY_FRACTION }
fn default_critical_anomaly_score() -> f64 { defaults::CRITICAL_ANOMALY_SCORE }
fn default_max_flagged_identifiers() -> usize { defaults::MAX_FLAGGED_IDENTIFIERS }
fn default_min_reliable_holdout() -> usize { defaults::MIN_RELIABLE_HOLDOUT }
fn default_max_imputed_fraction() -> f64 { defaults::MAX_IMPUTED_FRACTION }
fn default_cost_concentration_warning() -> f64 { defaults::COST_CONCENTRATION_WARNING }
fn default_cost_trend_warning() -> f64 { defaults::COST_TREND_WARNING }

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            top_n_features: default_top_n_features(),
            max_relative_error: default_max_relative_error(),
            critical_anomaly_fraction: default_critical_anomaly_fraction(),
            critical_anomaly_score: default_critical_anomaly_score(),
            max_flagged_identifiers: default_max_flagged_identifiers(),
            min_reliable_holdout: default_min_reliable_holdout(),
            max_imputed_fraction: default_max_imputed_fraction(),
            cost_concentration_warning: default_cost_concentration_warning(),
            cost_trend_warning: default_cost_trend_warning(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let c = AnalysisConfig::default();
        assert!((c.model.holdout_ratio - 0.2).abs() < f64::EPSILON);
        assert_eq!(c.model.seed, 42);
        assert_eq!(c.model.min_rows, 10);
        assert!((c.anomaly.threshold_percentile - 90.0).abs() < f64::EPSILON);
        assert_eq!(c.insights.top_n_features, 3);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r#"
[model]
seed = 7
holdout_ratio = 0.3
"#,
        )
        .unwrap();
        assert_eq!(config.model.seed, 7);
        assert!((config.model.holdout_ratio - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.model.min_rows, defaults::MIN_ROWS);
        assert_eq!(config.anomaly, AnomalyConfig::default());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = AnalysisConfig::default();
        config.model.holdout_ratio = 1.5;
        config.anomaly.threshold_percentile = 120.0;
        config.insights.top_n_features = 0;

        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 3);
                assert!(errors.iter().any(|e| e.contains("holdout_ratio")));
                assert!(errors.iter().any(|e| e.contains("threshold_percentile")));
                assert!(errors.iter().any(|e| e.contains("top_n_features")));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = AnalysisConfig::default();
        config.anomaly.method = AnomalyMethod::ZScore;
        config.anomaly.score_threshold = Some(0.6);
        config.features.categorical_encoding = CategoricalEncoding::Frequency;

        let toml_str = config.to_toml().unwrap();
        let parsed = AnalysisConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_score_threshold_takes_precedence() {
        let mut anomaly = AnomalyConfig::default();
        assert_eq!(anomaly.threshold_rule(), ThresholdRule::Percentile(90.0));
        anomaly.score_threshold = Some(0.65);
        assert_eq!(anomaly.threshold_rule(), ThresholdRule::Absolute(0.65));
    }

    #[test]
    fn test_critical_anomaly_score_range() {
        let mut config = AnalysisConfig::default();
        config.insights.critical_anomaly_score = 1.5;
        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(errors[0].contains("critical_anomaly_score"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let result = AnalysisConfig::from_toml_str("[model]\nseed = \"abc\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_, _))));
    }
}
