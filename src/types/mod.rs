//! Shared data structures for the maintenance cost analysis pipeline
//!
//! This module defines the immutable values handed from stage to stage:
//! - Stage 1: RawTable (query result set from the ingestion layer)
//! - Stage 2: ClassifiedSchema (per-column semantic roles)
//! - Stage 3: FeatureMatrix (numeric features + cost target)
//! - Stage 4: TrainedModel (ridge regression, metrics, importances)
//! - Stage 5: AnomalyReport (per-record structural outlier scores)
//! - Stage 6: InsightSet (severity-ranked findings)
//! - Output: AnalysisResult (the serializable bundle for the report layer)

mod table;
mod schema;
mod features;
mod model;
mod anomaly;
mod insight;
mod result;

pub use table::*;
pub use schema::*;
pub use features::*;
pub use model::*;
pub use anomaly::*;
pub use insight::*;
pub use result::*;
