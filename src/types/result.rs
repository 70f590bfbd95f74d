//! AnalysisResult: everything the report layer needs, in one serializable bundle.

use serde::{Deserialize, Serialize};

use super::{
    AnomalyReport, ClassifiedColumn, ExcludedFeature, FeatureImportance, InsightSet, ModelMetrics,
};

/// Cost totals for one categorical level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCost {
    pub key: String,
    pub total: f64,
    pub mean: f64,
    pub count: usize,
}

/// Cost total for one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyCost {
    pub month: String,
    pub total: f64,
    pub count: usize,
}

/// Raw cost aggregates over the target column (nulls skipped, nothing imputed).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostSummary {
    pub cost_column: String,
    pub total_cost: f64,
    pub mean_cost: f64,
    pub record_count: usize,
    /// Grouping column for `by_category`, when one exists
    pub category_column: Option<String>,
    /// Sorted by total descending, ties by key
    pub by_category: Vec<CategoryCost>,
    /// Chronological
    pub monthly: Vec<MonthlyCost>,
}

/// Complete output of one pipeline invocation.
///
/// The keys `insights`, `model_metrics`, `feature_importances` and `anomalies`
/// are a stable contract with the report layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub insights: InsightSet,
    pub model_metrics: ModelMetrics,
    pub feature_importances: Vec<FeatureImportance>,
    pub anomalies: AnomalyReport,
    pub target_column: String,
    pub column_roles: Vec<ClassifiedColumn>,
    pub excluded_features: Vec<ExcludedFeature>,
    pub cost_summary: CostSummary,
    pub low_confidence: bool,
}

impl AnalysisResult {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
