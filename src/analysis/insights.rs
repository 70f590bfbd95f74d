//! Insight Synthesizer
//!
//! Turns model statistics, anomaly scores and raw cost aggregates into
//! human-readable findings. Each rule runs independently and yields at most
//! one insight; the set is ordered by severity, then by rule priority.
//!
//! | Rule               | Severity          | Priority |
//! |--------------------|-------------------|----------|
//! | anomaly volume     | critical / info   | 1        |
//! | top features       | info              | 1        |
//! | model reliability  | warning           | 2        |
//! | low confidence     | warning           | 3        |
//! | imputed values     | warning           | 4        |
//! | cost concentration | warning / info    | 5        |
//! | cost trend         | warning           | 6        |

use tracing::{debug, info};

use super::aggregates::CostAggregator;
use super::features::FeatureBuilder;
use crate::config::InsightConfig;
use crate::types::{
    AnomalyReport, ClassifiedSchema, ColumnRole, CostSummary, Insight, InsightKind, InsightSet,
    Severity, TrainedModel,
};

pub struct InsightSynthesizer;

impl InsightSynthesizer {
    pub fn synthesize(
        model: &TrainedModel,
        anomalies: &AnomalyReport,
        schema: &ClassifiedSchema<'_>,
        config: &InsightConfig,
    ) -> InsightSet {
        let summary = CostAggregator::summarize(schema);
        Self::synthesize_with_summary(model, anomalies, schema, &summary, config)
    }

    /// Same as [`synthesize`](Self::synthesize) with precomputed aggregates.
    pub fn synthesize_with_summary(
        model: &TrainedModel,
        anomalies: &AnomalyReport,
        schema: &ClassifiedSchema<'_>,
        summary: &CostSummary,
        config: &InsightConfig,
    ) -> InsightSet {
        let insights: Vec<Insight> = [
            Self::anomaly_volume(anomalies, schema, model, config),
            Self::top_features(model, config),
            Self::model_reliability(model, config),
            Self::low_confidence(model, config),
            Self::imputed_values(schema, config),
            Self::cost_concentration(summary, config),
            Self::cost_trend(summary, config),
        ]
        .into_iter()
        .flatten()
        .collect();

        for i in &insights {
            debug!(kind = ?i.kind, severity = %i.severity, "Insight raised");
        }
        let set = InsightSet::from_unordered(insights);
        info!(
            total = set.len(),
            critical = set.count_by_severity(Severity::Critical),
            warning = set.count_by_severity(Severity::Warning),
            "Insights synthesized"
        );
        set
    }

    /// Critical when more than `critical_anomaly_fraction` of records are
    /// flagged with a score above `critical_anomaly_score`.
    fn anomaly_volume(
        anomalies: &AnomalyReport,
        schema: &ClassifiedSchema<'_>,
        model: &TrainedModel,
        config: &InsightConfig,
    ) -> Option<Insight> {
        let flagged = anomalies.flagged_count();
        if flagged == 0 {
            return None;
        }
        let total = anomalies.records.len();
        let severe: Vec<usize> = anomalies
            .records
            .iter()
            .filter(|r| r.is_anomaly && r.score > config.critical_anomaly_score)
            .map(|r| r.row)
            .collect();
        let severe_fraction = severe.len() as f64 / total as f64;

        if severe_fraction > config.critical_anomaly_fraction {
            let identifiers = Self::flagged_identifiers(&severe, schema, model, config);
            Some(Insight::new(
                InsightKind::AnomalyVolume,
                Severity::Critical,
                1,
                "Unusual maintenance records detected",
                ("severe_fraction", severe_fraction),
                format!(
                    "{} of {total} records ({:.1}%) score above {:.2}, beyond the {:.1}% alert level. Most affected: {}.",
                    severe.len(),
                    severe_fraction * 100.0,
                    config.critical_anomaly_score,
                    config.critical_anomaly_fraction * 100.0,
                    identifiers.join(", ")
                ),
            ))
        } else {
            let fraction = anomalies.flagged_fraction();
            Some(Insight::new(
                InsightKind::AnomalyVolume,
                Severity::Info,
                1,
                "Few unusual maintenance records",
                ("flagged_fraction", fraction),
                format!(
                    "{flagged} of {total} records ({:.1}%) scored above the anomaly cutoff of {:.3}.",
                    fraction * 100.0,
                    anomalies.cutoff
                ),
            ))
        }
    }

    /// Distinct identifiers of the given rows, in the order given.
    fn flagged_identifiers(
        rows: &[usize],
        schema: &ClassifiedSchema<'_>,
        model: &TrainedModel,
        config: &InsightConfig,
    ) -> Vec<String> {
        let key = schema
            .columns_with(ColumnRole::CategoricalKey)
            .find(|c| c.name != model.target_column)
            .and_then(|c| schema.table().column(&c.name));

        let mut identifiers: Vec<String> = Vec::new();
        for &row in rows {
            let label = key
                .and_then(|column| column.values.get(row))
                .and_then(|v| v.category_label())
                .unwrap_or_else(|| format!("row {row}"));
            if !identifiers.contains(&label) {
                identifiers.push(label);
            }
            if identifiers.len() >= config.max_flagged_identifiers {
                break;
            }
        }
        identifiers
    }

    fn top_features(model: &TrainedModel, config: &InsightConfig) -> Option<Insight> {
        let top: Vec<_> = model
            .top_features(config.top_n_features)
            .iter()
            .filter(|f| f.importance > 0.0)
            .collect();
        let first = top.first()?;

        let named: Vec<String> = top
            .iter()
            .map(|f| format!("{} ({:.0}%)", f.feature, f.importance * 100.0))
            .collect();
        Some(Insight::new(
            InsightKind::TopFeatures,
            Severity::Info,
            1,
            "Main drivers of maintenance cost",
            ("top_feature_importance", first.importance),
            format!(
                "Predicted {} is driven mostly by {}.",
                model.target_column,
                named.join(", ")
            ),
        ))
    }

    fn model_reliability(model: &TrainedModel, config: &InsightConfig) -> Option<Insight> {
        let relative = model.metrics.relative_mae;
        (relative > config.max_relative_error).then(|| {
            Insight::new(
                InsightKind::ModelReliability,
                Severity::Warning,
                2,
                "Cost model has high prediction error",
                ("relative_mae", relative),
                format!(
                    "Average prediction error is {:.1}% of typical cost (MAE {:.2}), above the {:.1}% limit. Treat cost drivers as indicative only.",
                    relative * 100.0,
                    model.metrics.mae,
                    config.max_relative_error * 100.0
                ),
            )
        })
    }

    fn low_confidence(model: &TrainedModel, config: &InsightConfig) -> Option<Insight> {
        let holdout = model.metrics.holdout_rows;
        if !model.low_confidence && holdout >= config.min_reliable_holdout {
            return None;
        }
        let narrative = if model.low_confidence {
            format!(
                "No holdout rows were available, so the model was evaluated on its own {} training rows. Metrics are optimistic.",
                model.metrics.train_rows
            )
        } else {
            format!(
                "Only {holdout} holdout rows were available (fewer than {}). Metrics may be unstable.",
                config.min_reliable_holdout
            )
        };
        Some(Insight::new(
            InsightKind::LowConfidence,
            Severity::Warning,
            3,
            "Model evaluated on little data",
            ("holdout_rows", holdout as f64),
            narrative,
        ))
    }

    fn imputed_values(schema: &ClassifiedSchema<'_>, config: &InsightConfig) -> Option<Insight> {
        let table = schema.table();
        let (missing, total) = schema
            .columns()
            .iter()
            .filter(|c| c.roles.iter().any(|r| *r != ColumnRole::Unclassified))
            .filter_map(|c| table.column(&c.name).map(|column| (c, column)))
            .fold((0usize, 0usize), |(m, t), (meta, column)| {
                (m + FeatureBuilder::missing_cells(meta, column), t + column.len())
            });
        if total == 0 {
            return None;
        }
        let fraction = missing as f64 / total as f64;
        (fraction > config.max_imputed_fraction).then(|| {
            Insight::new(
                InsightKind::ImputedValues,
                Severity::Warning,
                4,
                "Many values were imputed",
                ("imputed_fraction", fraction),
                format!(
                    "{missing} of {total} cells ({:.1}%) in analysed columns were missing and filled with medians or an '{}' category.",
                    fraction * 100.0,
                    crate::config::defaults::UNKNOWN_CATEGORY
                ),
            )
        })
    }

    fn cost_concentration(summary: &CostSummary, config: &InsightConfig) -> Option<Insight> {
        if summary.by_category.len() < 2 || summary.total_cost <= 0.0 {
            return None;
        }
        let top = &summary.by_category[0];
        let share = top.total / summary.total_cost;
        let column = summary.category_column.as_deref().unwrap_or("category");

        let (severity, title) = if share > config.cost_concentration_warning {
            (Severity::Warning, "Maintenance cost is concentrated")
        } else {
            (Severity::Info, "Largest cost category")
        };
        Some(Insight::new(
            InsightKind::CostConcentration,
            severity,
            5,
            title,
            ("top_category_share", share),
            format!(
                "{column} '{}' accounts for {:.1}% of total {} ({:.2} of {:.2}) over {} records.",
                top.key,
                share * 100.0,
                summary.cost_column,
                top.total,
                summary.total_cost,
                top.count
            ),
        ))
    }

    fn cost_trend(summary: &CostSummary, config: &InsightConfig) -> Option<Insight> {
        let (latest, earlier) = summary.monthly.split_last()?;
        if earlier.len() < 2 {
            return None;
        }
        let baseline = earlier.iter().map(|m| m.total).sum::<f64>() / earlier.len() as f64;
        if baseline <= 0.0 {
            return None;
        }
        let growth = (latest.total - baseline) / baseline;
        (growth > config.cost_trend_warning).then(|| {
            Insight::new(
                InsightKind::CostTrend,
                Severity::Warning,
                6,
                "Maintenance cost is rising",
                ("latest_month_growth", growth),
                format!(
                    "Cost in {} was {:.2}, {:.1}% above the average of the previous {} months ({:.2}).",
                    latest.month,
                    latest.total,
                    growth * 100.0,
                    earlier.len(),
                    baseline
                ),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ColumnClassifier;
    use crate::config::ClassifierConfig;
    use crate::types::{
        AnomalyMethod, AnomalyRecord, CategoryCost, Column, FeatureImportance, ModelMetrics,
        MonthlyCost, RawTable, RoleOverrides, ThresholdRule,
    };
    use chrono::NaiveDate;

    fn table(rows: usize) -> RawTable {
        let ids: Vec<Option<String>> = (0..rows).map(|i| Some(format!("EQ{}", i % 4))).collect();
        RawTable::new(vec![
            Column::text("equipment_id", ids),
            Column::dates(
                "maintenance_date",
                (0..rows).map(|i| {
                    NaiveDate::from_ymd_opt(2024, 1, 1 + (i % 28) as u32)
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                }),
            ),
            Column::numeric("maintenance_cost", (0..rows).map(|i| Some(100.0 + i as f64))),
        ])
        .unwrap()
    }

    fn model() -> TrainedModel {
        TrainedModel {
            target_column: "maintenance_cost".to_string(),
            intercept: 100.0,
            coefficients: vec![],
            metrics: ModelMetrics {
                mae: 5.0,
                rmse: 6.0,
                r_squared: Some(0.8),
                baseline_mae: 20.0,
                relative_mae: 0.05,
                train_rows: 16,
                holdout_rows: 4,
            },
            feature_importances: vec![
                FeatureImportance {
                    feature: "maintenance_date_elapsed_days".into(),
                    source_column: "maintenance_date".into(),
                    importance: 0.7,
                },
                FeatureImportance {
                    feature: "equipment_id=EQ1".into(),
                    source_column: "equipment_id".into(),
                    importance: 0.3,
                },
                FeatureImportance {
                    feature: "equipment_id=EQ2".into(),
                    source_column: "equipment_id".into(),
                    importance: 0.0,
                },
            ],
            low_confidence: false,
            seed: 42,
        }
    }

    fn anomalies(rows: usize, flagged: &[usize]) -> AnomalyReport {
        let mut records: Vec<AnomalyRecord> = (0..rows)
            .map(|row| AnomalyRecord {
                row,
                score: if flagged.contains(&row) { 0.8 } else { 0.4 },
                is_anomaly: flagged.contains(&row),
            })
            .collect();
        records.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.row.cmp(&b.row)));
        AnomalyReport {
            method: AnomalyMethod::IsolationForest,
            threshold: ThresholdRule::Percentile(90.0),
            cutoff: 0.5,
            records,
        }
    }

    fn synthesize(table: &RawTable, report: &AnomalyReport, model: &TrainedModel) -> InsightSet {
        let schema =
            ColumnClassifier::classify(table, &RoleOverrides::new(), &ClassifierConfig::default())
                .unwrap();
        InsightSynthesizer::synthesize(model, report, &schema, &InsightConfig::default())
    }

    #[test]
    fn test_top_features_skip_zero_importance() {
        let t = table(20);
        let set = synthesize(&t, &anomalies(20, &[]), &model());
        let top = set.find(InsightKind::TopFeatures).unwrap();
        assert_eq!(top.severity, Severity::Info);
        assert!(top.narrative.contains("maintenance_date_elapsed_days"));
        assert!(top.narrative.contains("equipment_id=EQ1"));
        assert!(!top.narrative.contains("EQ2"));
    }

    #[test]
    fn test_critical_anomalies_name_identifiers() {
        let t = table(20);
        let set = synthesize(&t, &anomalies(20, &[1, 5, 6]), &model());
        let first = set.iter().next().unwrap();
        assert_eq!(first.kind, InsightKind::AnomalyVolume);
        assert_eq!(first.severity, Severity::Critical);
        // rows 1 and 5 share EQ1
        assert!(first.narrative.contains("EQ1, EQ2"));
        assert!((first.supporting_metric.value - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_single_anomaly_below_threshold_is_info() {
        let t = table(40);
        let set = synthesize(&t, &anomalies(40, &[3]), &model());
        let insight = set.find(InsightKind::AnomalyVolume).unwrap();
        assert_eq!(insight.severity, Severity::Info);
    }

    #[test]
    fn test_percentile_flags_with_moderate_scores_are_info() {
        let t = table(20);
        let mut report = anomalies(20, &[2, 9]);
        for record in &mut report.records {
            if record.is_anomaly {
                record.score = 0.62;
            }
        }
        let set = synthesize(&t, &report, &model());
        let insight = set.find(InsightKind::AnomalyVolume).unwrap();
        assert_eq!(insight.severity, Severity::Info);
        assert_eq!(insight.supporting_metric.name, "flagged_fraction");
        assert!((insight.supporting_metric.value - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_no_anomaly_insight_without_flags() {
        let t = table(20);
        let set = synthesize(&t, &anomalies(20, &[]), &model());
        assert!(set.find(InsightKind::AnomalyVolume).is_none());
    }

    #[test]
    fn test_reliability_and_low_confidence_warnings() {
        let t = table(20);
        let mut m = model();
        m.metrics.relative_mae = 0.4;
        m.low_confidence = true;
        m.metrics.holdout_rows = 0;
        let set = synthesize(&t, &anomalies(20, &[]), &m);

        let kinds: Vec<InsightKind> = set.iter().map(|i| i.kind).collect();
        assert_eq!(
            &kinds[..2],
            &[InsightKind::ModelReliability, InsightKind::LowConfidence]
        );
        assert_eq!(set.count_by_severity(Severity::Warning), 2);
    }

    #[test]
    fn test_small_holdout_raises_low_confidence() {
        let t = table(20);
        let set = synthesize(&t, &anomalies(20, &[]), &model());
        let insight = set.find(InsightKind::LowConfidence).unwrap();
        assert_eq!(insight.supporting_metric.value, 4.0);
    }

    #[test]
    fn test_imputed_values_warning() {
        let t = RawTable::new(vec![
            Column::text("equipment_id", [Some("A"), None, Some("B"), None]),
            Column::numeric("repair_cost", [Some(1.0), Some(2.0), None, Some(4.0)]),
            Column::text("notes", [None::<&str>, None, None, None]),
        ])
        .unwrap();
        let set = synthesize(&t, &anomalies(4, &[]), &model());
        let insight = set.find(InsightKind::ImputedValues).unwrap();
        // notes is unclassified and does not count
        assert!((insight.supporting_metric.value - 3.0 / 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_imputed_values_count_blank_and_unparseable_cells() {
        let t = RawTable::new(vec![
            Column::text("equipment_id", [Some("A"), Some("   "), Some("B"), Some("A")]),
            Column::text(
                "service_day",
                [Some("2024-01-05"), Some("pending"), Some("2024-02-01"), Some("2024-03-01")],
            ),
            Column::numeric("repair_cost", [Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
        ])
        .unwrap();
        let overrides = RoleOverrides::from([("service_day".to_string(), ColumnRole::DateTime)]);
        let schema =
            ColumnClassifier::classify(&t, &overrides, &ClassifierConfig::default()).unwrap();
        let set = InsightSynthesizer::synthesize(
            &model(),
            &anomalies(4, &[]),
            &schema,
            &InsightConfig::default(),
        );
        let insight = set.find(InsightKind::ImputedValues).unwrap();
        // one blank label and one unparseable date out of 12 cells
        assert!((insight.supporting_metric.value - 2.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_cost_concentration_severity() {
        let mut summary = CostSummary {
            cost_column: "cost".into(),
            total_cost: 100.0,
            category_column: Some("equipment_id".into()),
            by_category: vec![
                CategoryCost {
                    key: "PUMP".into(),
                    total: 70.0,
                    mean: 35.0,
                    count: 2,
                },
                CategoryCost {
                    key: "FAN".into(),
                    total: 30.0,
                    mean: 30.0,
                    count: 1,
                },
            ],
            ..CostSummary::default()
        };
        let config = InsightConfig::default();
        let warning = InsightSynthesizer::cost_concentration(&summary, &config).unwrap();
        assert_eq!(warning.severity, Severity::Warning);
        assert!(warning.narrative.contains("'PUMP'"));

        // remaining spend sits in categories not listed here
        summary.total_cost = 200.0;
        let info = InsightSynthesizer::cost_concentration(&summary, &config).unwrap();
        assert_eq!(info.severity, Severity::Info);
    }

    #[test]
    fn test_cost_trend_needs_three_months() {
        let month = |m: &str, total: f64| MonthlyCost {
            month: m.into(),
            total,
            count: 1,
        };
        let config = InsightConfig::default();
        let mut summary = CostSummary {
            monthly: vec![month("2024-01", 100.0), month("2024-02", 200.0)],
            ..CostSummary::default()
        };
        assert!(InsightSynthesizer::cost_trend(&summary, &config).is_none());

        summary.monthly.push(month("2024-03", 300.0));
        let insight = InsightSynthesizer::cost_trend(&summary, &config).unwrap();
        assert!((insight.supporting_metric.value - 1.0).abs() < 1e-9);

        summary.monthly[2].total = 160.0;
        assert!(InsightSynthesizer::cost_trend(&summary, &config).is_none());
    }
}
