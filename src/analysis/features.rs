//! Feature Builder
//!
//! Turns an accepted ClassifiedSchema into a dense FeatureMatrix:
//! 1. Target = first `Cost` column (median-imputed)
//! 2. Numeric features = remaining `NumericFeature` columns (median-imputed)
//! 3. Calendar features from the first `DateTime` column (median timestamp imputed)
//! 4. One-hot or frequency encoding of `CategoricalKey` columns ("unknown" imputed).
//!    One-hot drops the first sorted level as the reference, so the indicators
//!    never sum to a constant alongside the intercept
//! 5. Zero-variance features dropped and recorded
//!
//! The target column never contributes a feature, whatever other roles it carries.

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDateTime};
use tracing::{debug, info};

use super::stats;
use crate::config::{defaults::UNKNOWN_CATEGORY, CategoricalEncoding, FeatureConfig};
use crate::error::AnalysisError;
use crate::types::{
    ClassifiedColumn, ClassifiedSchema, Column, ColumnRole, ExcludedFeature, FeatureColumn,
    FeatureKind, FeatureMatrix, Value,
};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A feature column under construction, before the variance check.
struct Candidate {
    meta: FeatureColumn,
    values: Vec<f64>,
}

impl Candidate {
    fn new(name: String, source: &str, kind: FeatureKind, values: Vec<f64>) -> Self {
        Self {
            meta: FeatureColumn {
                name,
                source_column: source.to_string(),
                kind,
            },
            values,
        }
    }
}

pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn build(
        schema: &ClassifiedSchema<'_>,
        config: &FeatureConfig,
    ) -> Result<FeatureMatrix, AnalysisError> {
        let rows = schema.row_count();
        let table = schema.table();
        let mut excluded = Vec::new();
        let mut imputed_cells = 0usize;

        // Validation guarantees a Cost column; an empty one is still refused
        let target_meta = schema
            .first_with(ColumnRole::Cost)
            .ok_or_else(|| AnalysisError::SchemaValidation {
                missing: vec![ColumnRole::Cost],
            })?;
        let target_column = target_meta.name.clone();
        let target_data = table.column(&target_column).ok_or_else(|| {
            AnalysisError::SchemaValidation {
                missing: vec![ColumnRole::Cost],
            }
        })?;
        let (target, target_imputed) = Self::impute_numeric(target_data).ok_or_else(|| {
            AnalysisError::NonNumericTarget {
                column: target_column.clone(),
            }
        })?;
        imputed_cells += target_imputed;

        if target_meta.has(ColumnRole::NumericFeature) || target_meta.has(ColumnRole::CategoricalKey) {
            excluded.push(ExcludedFeature::new(&target_column, "prediction target"));
        }

        let mut candidates: Vec<Candidate> = Vec::new();
        let mut used: HashSet<&str> = HashSet::from([target_column.as_str()]);

        // Numeric features
        for meta in schema.columns_with(ColumnRole::NumericFeature) {
            if used.contains(meta.name.as_str()) {
                continue;
            }
            let Some(column) = table.column(&meta.name) else { continue };
            match Self::impute_numeric(column) {
                Some((values, imputed)) => {
                    imputed_cells += imputed;
                    candidates.push(Candidate::new(
                        meta.name.clone(),
                        &meta.name,
                        FeatureKind::Numeric,
                        values,
                    ));
                }
                None => excluded.push(ExcludedFeature::new(&meta.name, "no numeric values")),
            }
            used.insert(meta.name.as_str());
        }

        // Calendar features from the first date column; later date columns are ignored
        let mut date_source: Option<&str> = None;
        for meta in schema.columns_with(ColumnRole::DateTime) {
            if used.contains(meta.name.as_str()) {
                continue;
            }
            if date_source.is_some() {
                excluded.push(ExcludedFeature::new(&meta.name, "secondary date column"));
                continue;
            }
            let Some(column) = table.column(&meta.name) else { continue };
            match Self::date_features(column) {
                Some((derived, imputed)) => {
                    imputed_cells += imputed;
                    candidates.extend(derived);
                    date_source = Some(meta.name.as_str());
                }
                None => excluded.push(ExcludedFeature::new(&meta.name, "no parseable dates")),
            }
            used.insert(meta.name.as_str());
        }

        // Categorical encodings
        for meta in schema.columns_with(ColumnRole::CategoricalKey) {
            if used.contains(meta.name.as_str()) {
                continue;
            }
            let Some(column) = table.column(&meta.name) else { continue };
            let (encoded, reference, imputed) = Self::encode_categorical(column, config);
            imputed_cells += imputed;
            candidates.extend(encoded);
            if let Some(reference) = reference {
                excluded.push(ExcludedFeature::new(reference, "reference level"));
            }
            used.insert(meta.name.as_str());
        }

        // Variance check
        let mut features = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();
        for candidate in candidates {
            if stats::is_constant(&candidate.values) {
                debug!(feature = %candidate.meta.name, "Dropping zero-variance feature");
                excluded.push(ExcludedFeature::new(candidate.meta.name, "zero variance"));
            } else {
                features.push(candidate.meta);
                columns.push(candidate.values);
            }
        }

        if features.is_empty() {
            return Err(AnalysisError::InsufficientFeatures {
                excluded: excluded.into_iter().map(|e| e.name).collect(),
            });
        }

        let data: Vec<Vec<f64>> = (0..rows)
            .map(|r| columns.iter().map(|c| c[r]).collect())
            .collect();

        info!(
            rows,
            features = features.len(),
            excluded = excluded.len(),
            imputed_cells,
            target = %target_column,
            "Feature matrix built"
        );

        Ok(FeatureMatrix {
            features,
            data,
            target,
            target_column,
            excluded,
            imputed_cells,
        })
    }

    /// Cells of `column` the builder would impute, judged by the role it is
    /// consumed under: numeric for `Cost`/`NumericFeature`, then date, then
    /// categorical label. Unclassified columns have none.
    pub fn missing_cells(meta: &ClassifiedColumn, column: &Column) -> usize {
        let missing: fn(&Value) -> bool =
            if meta.has(ColumnRole::Cost) || meta.has(ColumnRole::NumericFeature) {
                |v| v.as_f64().is_none()
            } else if meta.has(ColumnRole::DateTime) {
                |v| v.as_datetime().is_none()
            } else if meta.has(ColumnRole::CategoricalKey) {
                |v| v.category_label().is_none()
            } else {
                return 0;
            };
        column.values.iter().filter(|v| missing(v)).count()
    }

    /// Median-impute a numeric column. `None` when the column has no finite values.
    fn impute_numeric(column: &Column) -> Option<(Vec<f64>, usize)> {
        let present: Vec<f64> = column.values.iter().filter_map(|v| v.as_f64()).collect();
        let fill = stats::median(&present)?;
        let mut imputed = 0;
        let values = column
            .values
            .iter()
            .map(|v| {
                v.as_f64().unwrap_or_else(|| {
                    imputed += 1;
                    fill
                })
            })
            .collect();
        Some((values, imputed))
    }

    /// Day-of-week, month, day-of-month and elapsed days for a date column.
    fn date_features(column: &Column) -> Option<(Vec<Candidate>, usize)> {
        let parsed: Vec<Option<NaiveDateTime>> =
            column.values.iter().map(|v| v.as_datetime()).collect();
        let epochs: Vec<f64> = parsed
            .iter()
            .flatten()
            .map(|dt| dt.and_utc().timestamp() as f64)
            .collect();
        let median_epoch = stats::median(&epochs)?;
        let fill = chrono::DateTime::from_timestamp(median_epoch as i64, 0)?.naive_utc();

        let imputed = parsed.iter().filter(|p| p.is_none()).count();
        let dates: Vec<NaiveDateTime> = parsed.into_iter().map(|p| p.unwrap_or(fill)).collect();

        let name = column.name.as_str();
        let derived = vec![
            Self::date_part(name, "day_of_week", &dates, |d| {
                f64::from(d.weekday().num_days_from_monday())
            }),
            Self::date_part(name, "month", &dates, |d| f64::from(d.month())),
            Self::date_part(name, "day_of_month", &dates, |d| f64::from(d.day())),
            Self::date_part(name, "elapsed_days", &dates, |d| {
                d.and_utc().timestamp() as f64 / SECONDS_PER_DAY
            }),
        ];
        Some((derived, imputed))
    }

    fn date_part(
        source: &str,
        suffix: &str,
        dates: &[NaiveDateTime],
        part: impl Fn(&NaiveDateTime) -> f64,
    ) -> Candidate {
        Candidate::new(
            format!("{source}_{suffix}"),
            source,
            FeatureKind::DatePart,
            dates.iter().map(part).collect(),
        )
    }

    /// Encode a categorical column; missing cells become the "unknown" level.
    ///
    /// Returns the encoded candidates, the name of the dropped one-hot
    /// reference level (if any) and the number of imputed cells.
    fn encode_categorical(
        column: &Column,
        config: &FeatureConfig,
    ) -> (Vec<Candidate>, Option<String>, usize) {
        let mut imputed = 0;
        let labels: Vec<String> = column
            .values
            .iter()
            .map(|v| {
                v.category_label().unwrap_or_else(|| {
                    imputed += 1;
                    UNKNOWN_CATEGORY.to_string()
                })
            })
            .collect();

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for label in &labels {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }

        let name = &column.name;
        let use_frequency = config.categorical_encoding == CategoricalEncoding::Frequency
            || counts.len() > config.max_one_hot_levels;

        if use_frequency {
            if config.categorical_encoding == CategoricalEncoding::OneHot {
                debug!(
                    column = %name,
                    levels = counts.len(),
                    max = config.max_one_hot_levels,
                    "Too many levels for one-hot, using frequency encoding"
                );
            }
            let n = labels.len() as f64;
            let frequency = Candidate::new(
                format!("{name}_frequency"),
                name,
                FeatureKind::Frequency,
                labels.iter().map(|l| counts[l.as_str()] as f64 / n).collect(),
            );
            return (vec![frequency], None, imputed);
        }

        let mut levels = counts.keys();
        let reference = levels.next().map(|level| format!("{name}={level}"));
        let encoded = levels
            .map(|level| {
                Candidate::new(
                    format!("{name}={level}"),
                    name,
                    FeatureKind::OneHot,
                    labels
                        .iter()
                        .map(|l| if l.as_str() == *level { 1.0 } else { 0.0 })
                        .collect(),
                )
            })
            .collect();

        (encoded, reference, imputed)
    }
}
