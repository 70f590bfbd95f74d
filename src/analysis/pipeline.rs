//! Analysis Pipeline
//!
//! ```text
//! STAGE 1: Column Classifier   (roles from names + sampled values)
//! STAGE 2: Schema Validator    (Cost, DateTime, CategoricalKey present)
//! STAGE 3: Row floor guard     (rows >= model.min_rows)
//! STAGE 4: Feature Builder     (matrix + target, leakage-free)
//! STAGE 5: Model Trainer       (ridge fit, holdout metrics, importances)
//! STAGE 6: Anomaly Detector    (per-record structural scores)
//! STAGE 7: Cost aggregates     (raw totals by category and month)
//! STAGE 8: Insight Synthesizer (ranked findings)
//! ```
//!
//! Each stage consumes only the immutable output of the previous ones. The
//! first error stops the run; nothing is retried or substituted.

use std::time::Instant;

use tracing::{info, warn};

use super::{
    AnomalyDetector, ColumnClassifier, CostAggregator, FeatureBuilder, InsightSynthesizer,
    ModelTrainer, SchemaValidator,
};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::types::{AnalysisResult, RawTable, RoleOverrides};

/// Runs the full analysis for one table with one configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse `table`, forcing the roles named in `overrides`.
    pub fn run(
        &self,
        table: &RawTable,
        overrides: &RoleOverrides,
    ) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        info!(
            rows = table.row_count(),
            columns = table.column_count(),
            overrides = overrides.len(),
            "Analysis started"
        );

        let schema = ColumnClassifier::classify(table, overrides, &self.config.classifier)?;
        let schema = SchemaValidator::validate(schema)?;

        let rows = schema.row_count();
        if rows < self.config.model.min_rows {
            warn!(rows, required = self.config.model.min_rows, "Row floor not met");
            return Err(AnalysisError::InsufficientData {
                rows,
                required: self.config.model.min_rows,
            });
        }

        let matrix = FeatureBuilder::build(&schema, &self.config.features)?;
        let model = ModelTrainer::train(&matrix, &self.config.model)?;
        let anomalies = AnomalyDetector::detect(&matrix, &self.config.anomaly, self.config.model.seed);
        let cost_summary = CostAggregator::summarize(&schema);
        let insights = InsightSynthesizer::synthesize_with_summary(
            &model,
            &anomalies,
            &schema,
            &cost_summary,
            &self.config.insights,
        );

        info!(
            target = %model.target_column,
            features = matrix.feature_count(),
            flagged = anomalies.flagged_count(),
            insights = insights.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(AnalysisResult {
            insights,
            model_metrics: model.metrics,
            feature_importances: model.feature_importances,
            anomalies,
            target_column: model.target_column,
            column_roles: schema.columns().to_vec(),
            excluded_features: matrix.excluded,
            cost_summary,
            low_confidence: model.low_confidence,
        })
    }
}
