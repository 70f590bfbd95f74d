//! Column Classifier
//!
//! Labels each column of a RawTable with semantic roles using two checks, in order:
//! 1. Case-insensitive keyword match on the column name, kept only when the
//!    column's values are compatible with the role
//! 2. Value-type fallback when no name match survives
//!
//! Classification is a pure function of column names and the first
//! `sample_size` non-null values, so identical tables always classify identically.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::config::ClassifierConfig;
use crate::error::AnalysisError;
use crate::types::{
    ClassifiedColumn, ClassifiedSchema, Column, ColumnKind, ColumnRole, RawTable, RoleOverrides,
    Value,
};

/// Name keywords marking a cost column.
pub const COST_KEYWORDS: [&str; 4] = ["cost", "price", "amount", "expense"];

/// Name keywords marking a date/time column.
pub const DATE_KEYWORDS: [&str; 3] = ["date", "time", "timestamp"];

/// Name keywords marking a categorical identity column.
pub const CATEGORICAL_KEYWORDS: [&str; 5] = ["equipment", "type", "status", "category", "id"];

/// What the sampled values of a column look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueProfile {
    /// No non-null values
    Empty,
    Numeric,
    /// Typed dates, or text that parses as dates throughout the sample
    Temporal,
    Text,
}

/// Stateless column role classifier
pub struct ColumnClassifier;

impl ColumnClassifier {
    /// Classify every column, then apply caller overrides.
    ///
    /// Fails only when an override names a column the table does not have.
    pub fn classify<'t>(
        table: &'t RawTable,
        overrides: &RoleOverrides,
        config: &ClassifierConfig,
    ) -> Result<ClassifiedSchema<'t>, AnalysisError> {
        if let Some(unknown) = overrides.keys().find(|name| table.column(name).is_none()) {
            return Err(AnalysisError::UnknownOverrideColumn(unknown.clone()));
        }

        let columns: Vec<ClassifiedColumn> = table
            .columns()
            .iter()
            .map(|column| match overrides.get(&column.name) {
                Some(forced) => {
                    debug!(column = %column.name, role = %forced, "Role override applied");
                    ClassifiedColumn {
                        name: column.name.clone(),
                        kind: column.kind,
                        roles: BTreeSet::from([*forced]),
                        overridden: true,
                    }
                }
                None => ClassifiedColumn {
                    name: column.name.clone(),
                    kind: column.kind,
                    roles: Self::classify_column(column, config.sample_size),
                    overridden: false,
                },
            })
            .collect();

        for c in &columns {
            debug!(column = %c.name, kind = %c.kind, roles = ?c.roles, "Column classified");
        }
        info!(
            columns = columns.len(),
            cost = columns.iter().filter(|c| c.has(ColumnRole::Cost)).count(),
            datetime = columns.iter().filter(|c| c.has(ColumnRole::DateTime)).count(),
            categorical = columns.iter().filter(|c| c.has(ColumnRole::CategoricalKey)).count(),
            numeric = columns.iter().filter(|c| c.has(ColumnRole::NumericFeature)).count(),
            "Column classification complete"
        );

        Ok(ClassifiedSchema::new(table, columns))
    }

    /// Roles for a single column from its name and sampled values.
    pub fn classify_column(column: &Column, sample_size: usize) -> BTreeSet<ColumnRole> {
        let name = column.name.to_lowercase();
        let profile = Self::profile(column, sample_size);
        let mut roles = BTreeSet::new();

        if Self::name_matches(&name, &COST_KEYWORDS) && profile == ValueProfile::Numeric {
            roles.insert(ColumnRole::Cost);
            roles.insert(ColumnRole::NumericFeature);
        }
        if Self::name_matches(&name, &DATE_KEYWORDS) && profile == ValueProfile::Temporal {
            roles.insert(ColumnRole::DateTime);
        }
        if Self::name_matches(&name, &CATEGORICAL_KEYWORDS)
            && matches!(profile, ValueProfile::Numeric | ValueProfile::Text)
        {
            roles.insert(ColumnRole::CategoricalKey);
        }

        if roles.is_empty() {
            roles.insert(match profile {
                ValueProfile::Numeric => ColumnRole::NumericFeature,
                ValueProfile::Temporal => ColumnRole::DateTime,
                ValueProfile::Text | ValueProfile::Empty => ColumnRole::Unclassified,
            });
        }

        roles
    }

    fn name_matches(lower_name: &str, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| lower_name.contains(k))
    }

    fn profile(column: &Column, sample_size: usize) -> ValueProfile {
        let sample: Vec<&Value> = column.non_null().take(sample_size).collect();
        if sample.is_empty() {
            return ValueProfile::Empty;
        }

        match column.kind {
            ColumnKind::Numeric => ValueProfile::Numeric,
            ColumnKind::Date => ValueProfile::Temporal,
            ColumnKind::Text => {
                if sample.iter().all(|v| v.as_datetime().is_some()) {
                    ValueProfile::Temporal
                } else {
                    ValueProfile::Text
                }
            }
        }
    }
}
