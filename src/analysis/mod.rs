//! Adaptive maintenance-cost analysis engine
//!
//! Infers what each column of an arbitrary maintenance table means, builds a
//! leakage-free feature matrix from it, fits a cost model, scores structural
//! anomalies and condenses the results into ranked insights.
//!
//! ## Architecture
//! - `classifier`: column role inference (name keywords + value types)
//! - `validator`: required-role gate (Cost, DateTime, CategoricalKey)
//! - `features`: imputation, date parts, categorical encoding, target split
//! - `regression`: ridge regression solved by Cholesky factorization
//! - `trainer`: seeded holdout split, metrics, permutation importance
//! - `anomaly`: isolation forest / z-score scoring and flagging
//! - `aggregates`: raw cost totals by category and month
//! - `insights`: heuristic findings with severities
//! - `pipeline`: runs the stages in order
//! - `stats`: shared statistical helpers (statrs)

pub mod aggregates;
pub mod anomaly;
pub mod classifier;
pub mod features;
pub mod insights;
pub mod pipeline;
pub mod regression;
pub mod stats;
pub mod trainer;
pub mod validator;

pub use aggregates::CostAggregator;
pub use anomaly::AnomalyDetector;
pub use classifier::ColumnClassifier;
pub use features::FeatureBuilder;
pub use insights::InsightSynthesizer;
pub use pipeline::AnalysisPipeline;
pub use trainer::ModelTrainer;
pub use validator::SchemaValidator;
