//! Maintenance Analyzer: adaptive equipment-maintenance cost analysis
//!
//! Takes the result set of an arbitrary maintenance query and produces a cost
//! model, anomaly scores, ranked feature importances and heuristic insights,
//! without a fixed input schema.
//!
//! ## Architecture
//!
//! - **Ingest**: table sources (`CsvTableSource`) producing a `RawTable`
//! - **Analysis**: role inference, validation, features, model, anomalies, insights
//! - **Report**: emitters writing the `AnalysisResult` to disk
//! - **Config**: TOML-backed tuning knobs with documented defaults
//!
//! ```no_run
//! use maintenance_analyzer::{AnalysisConfig, AnalysisPipeline, RoleOverrides};
//! use maintenance_analyzer::ingest::{CsvTableSource, TableSource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = CsvTableSource::new("maintenance.csv").load()?;
//! let result = AnalysisPipeline::new(AnalysisConfig::default())
//!     .run(&table, &RoleOverrides::new())?;
//! println!("{}", result.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod ingest;
pub mod report;
pub mod types;

// Re-export configuration
pub use config::{AnalysisConfig, ConfigError};

// Re-export the error taxonomy
pub use error::AnalysisError;

// Re-export commonly used types
pub use types::{
    AnalysisResult, AnomalyReport, ClassifiedSchema, Column, ColumnKind, ColumnRole,
    FeatureMatrix, Insight, InsightSet, RawTable, RoleOverrides, Severity, TrainedModel, Value,
};

// Re-export pipeline stages
pub use analysis::{
    AnalysisPipeline, AnomalyDetector, ColumnClassifier, FeatureBuilder, InsightSynthesizer,
    ModelTrainer, SchemaValidator,
};

// Re-export collaborators
pub use ingest::{CsvTableSource, IngestError, TableSource};
pub use report::{JsonReportEmitter, ReportEmitter, ReportError};
