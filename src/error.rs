//! Analysis error taxonomy.
//!
//! Every variant is fatal for the invocation that raised it. Stages return
//! these directly and nothing inside the pipeline catches or retries them;
//! recoverable weaknesses (tiny holdout, heavy imputation) are reported as
//! warning insights instead.

use thiserror::Error;

use crate::types::ColumnRole;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// The classified table lacks one or more required roles
    #[error("Schema validation failed: no column found for role(s) {}", join_roles(.missing))]
    SchemaValidation { missing: Vec<ColumnRole> },

    /// The chosen Cost column holds no numeric values
    #[error("Target column '{column}' has no numeric values; the Cost role needs a numeric column")]
    NonNumericTarget { column: String },

    /// Every candidate feature was excluded
    #[error("Insufficient features: no usable feature columns remain (excluded: {})", .excluded.join(", "))]
    InsufficientFeatures { excluded: Vec<String> },

    /// Row count below the configured floor
    #[error("Insufficient data: {rows} rows (need at least {required})")]
    InsufficientData { rows: usize, required: usize },

    /// Numerical failure while fitting the regression
    #[error("Model fit failed: {reason} (features: {})", .features.join(", "))]
    ModelFit { reason: String, features: Vec<String> },

    /// A role override names a column the table does not have
    #[error("Role override refers to unknown column: {0}")]
    UnknownOverrideColumn(String),
}

fn join_roles(roles: &[ColumnRole]) -> String {
    roles
        .iter()
        .map(ColumnRole::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl AnalysisError {
    /// Roles missing from a failed schema validation; empty for other variants.
    pub fn missing_roles(&self) -> &[ColumnRole] {
        match self {
            Self::SchemaValidation { missing } => missing,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_missing_roles() {
        let err = AnalysisError::SchemaValidation {
            missing: vec![ColumnRole::Cost, ColumnRole::DateTime],
        };
        let msg = err.to_string();
        assert!(msg.contains("Cost, DateTime"), "got: {msg}");
        assert_eq!(err.missing_roles(), &[ColumnRole::Cost, ColumnRole::DateTime]);
    }

    #[test]
    fn test_model_fit_error_lists_features() {
        let err = AnalysisError::ModelFit {
            reason: "matrix is not positive definite".into(),
            features: vec!["a".into(), "b".into()],
        };
        assert!(err.to_string().contains("features: a, b"));
    }
}
