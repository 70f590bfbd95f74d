//! Raw cost aggregates over the target column.
//!
//! Aggregates read the table directly: null costs are skipped rather than
//! imputed, so the totals reflect recorded spend only.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::defaults::UNKNOWN_CATEGORY;
use crate::types::{CategoryCost, ClassifiedSchema, ColumnRole, CostSummary, MonthlyCost};

pub struct CostAggregator;

impl CostAggregator {
    /// Totals by category (first `CategoricalKey` column other than the
    /// target) and by calendar month (first `DateTime` column).
    pub fn summarize(schema: &ClassifiedSchema<'_>) -> CostSummary {
        let Some(cost) = schema.first_data_with(ColumnRole::Cost) else {
            return CostSummary::default();
        };
        let table = schema.table();

        let costs: Vec<Option<f64>> = cost.values.iter().map(|v| v.as_f64()).collect();
        let recorded: Vec<f64> = costs.iter().flatten().copied().collect();
        let total_cost: f64 = recorded.iter().sum();

        let category = schema
            .columns_with(ColumnRole::CategoricalKey)
            .find(|c| c.name != cost.name)
            .and_then(|c| table.column(&c.name));

        let mut by_category = Vec::new();
        if let Some(category) = category {
            let mut groups: BTreeMap<String, (f64, usize)> = BTreeMap::new();
            for (value, amount) in category.values.iter().zip(&costs) {
                let Some(amount) = amount else { continue };
                let key = value
                    .category_label()
                    .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());
                let entry = groups.entry(key).or_insert((0.0, 0));
                entry.0 += amount;
                entry.1 += 1;
            }
            by_category = groups
                .into_iter()
                .map(|(key, (total, count))| CategoryCost {
                    key,
                    total,
                    mean: total / count as f64,
                    count,
                })
                .collect();
            // BTreeMap order breaks ties by key
            by_category.sort_by(|a: &CategoryCost, b: &CategoryCost| b.total.total_cmp(&a.total));
        }

        let mut monthly = Vec::new();
        if let Some(dates) = schema.first_data_with(ColumnRole::DateTime) {
            let mut months: BTreeMap<String, (f64, usize)> = BTreeMap::new();
            for (value, amount) in dates.values.iter().zip(&costs) {
                let (Some(date), Some(amount)) = (value.as_datetime(), amount) else {
                    continue;
                };
                let entry = months
                    .entry(date.format("%Y-%m").to_string())
                    .or_insert((0.0, 0));
                entry.0 += amount;
                entry.1 += 1;
            }
            monthly = months
                .into_iter()
                .map(|(month, (total, count))| MonthlyCost {
                    month,
                    total,
                    count,
                })
                .collect();
        }

        debug!(
            cost_column = %cost.name,
            categories = by_category.len(),
            months = monthly.len(),
            "Cost aggregates computed"
        );

        CostSummary {
            cost_column: cost.name.clone(),
            total_cost,
            mean_cost: if recorded.is_empty() {
                0.0
            } else {
                total_cost / recorded.len() as f64
            },
            record_count: recorded.len(),
            category_column: category.map(|c| c.name.clone()),
            by_category,
            monthly,
        }
    }
}
