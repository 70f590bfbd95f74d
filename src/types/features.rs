//! FeatureMatrix: the numeric design matrix plus the cost target.

use serde::{Deserialize, Serialize};

/// How a matrix column was derived from the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Numeric column copied through (median-imputed)
    Numeric,
    /// Calendar component derived from the date column
    DatePart,
    /// Indicator for one categorical level
    OneHot,
    /// Share of rows holding the record's categorical level
    Frequency,
}

/// Metadata for one matrix column, used for importance attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub source_column: String,
    pub kind: FeatureKind,
}

/// A candidate feature (or source column) left out of the matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedFeature {
    pub name: String,
    pub reason: String,
}

impl ExcludedFeature {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Dense feature matrix with a parallel target vector.
///
/// Invariants: one row per table row, `data[r].len() == features.len()`,
/// and every cell (target included) is finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    pub features: Vec<FeatureColumn>,
    /// Row-major cells
    pub data: Vec<Vec<f64>>,
    pub target: Vec<f64>,
    pub target_column: String,
    pub excluded: Vec<ExcludedFeature>,
    /// Cells filled by median / sentinel imputation (target included)
    pub imputed_cells: usize,
}

impl FeatureMatrix {
    pub fn rows(&self) -> usize {
        self.data.len()
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name.clone()).collect()
    }

    /// Values of one feature across all rows.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.data.iter().map(|row| row[index]).collect()
    }

    /// True when no cell in the matrix or target is NaN or infinite.
    pub fn is_complete(&self) -> bool {
        self.target.iter().all(|v| v.is_finite())
            && self
                .data
                .iter()
                .all(|row| row.len() == self.features.len() && row.iter().all(|v| v.is_finite()))
    }
}
