//! Schema Validator
//!
//! Accepts a classified table only when at least one column carries each of
//! `Cost`, `DateTime` and `CategoricalKey`. There is no fallback schema: a
//! missing role stops the pipeline with the list of what is missing.

use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::types::ClassifiedSchema;

pub struct SchemaValidator;

impl SchemaValidator {
    /// Return the schema unchanged, or fail naming every missing role.
    pub fn validate(schema: ClassifiedSchema<'_>) -> Result<ClassifiedSchema<'_>, AnalysisError> {
        let missing = schema.missing_required_roles();
        if !missing.is_empty() {
            warn!(missing = ?missing, "Schema rejected: required roles absent");
            return Err(AnalysisError::SchemaValidation { missing });
        }

        info!(
            columns = schema.columns().len(),
            rows = schema.row_count(),
            "Schema accepted"
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ColumnClassifier;
    use crate::config::ClassifierConfig;
    use crate::types::{Column, ColumnRole, RawTable, RoleOverrides};
    use chrono::NaiveDate;

    fn classify(table: &RawTable) -> ClassifiedSchema<'_> {
        ColumnClassifier::classify(table, &RoleOverrides::new(), &ClassifierConfig::default())
            .unwrap()
    }

    fn day(d: u32) -> Option<chrono::NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 3, d).and_then(|x| x.and_hms_opt(0, 0, 0))
    }

    #[test]
    fn test_complete_schema_accepted() {
        let table = RawTable::new(vec![
            Column::text("equipment_id", [Some("EQ1")]),
            Column::dates("maintenance_date", [day(1)]),
            Column::numeric("maintenance_cost", [Some(10.0)]),
        ])
        .unwrap();
        let schema = classify(&table);
        let accepted = SchemaValidator::validate(schema.clone()).unwrap();
        assert_eq!(accepted, schema);
    }

    #[test]
    fn test_missing_cost_and_date_named() {
        let table = RawTable::new(vec![
            Column::text("equipment_id", [Some("EQ1")]),
            Column::text("notes", [Some("oil change")]),
        ])
        .unwrap();
        let err = SchemaValidator::validate(classify(&table)).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::SchemaValidation {
                missing: vec![ColumnRole::Cost, ColumnRole::DateTime]
            }
        );
    }

    #[test]
    fn test_missing_categorical_named() {
        let table = RawTable::new(vec![
            Column::dates("maintenance_date", [day(1)]),
            Column::numeric("maintenance_cost", [Some(10.0)]),
        ])
        .unwrap();
        let err = SchemaValidator::validate(classify(&table)).unwrap_err();
        assert_eq!(err.missing_roles(), &[ColumnRole::CategoricalKey]);
    }
}
