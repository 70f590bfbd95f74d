//! Insights: severity-ranked findings consumed by the report layer.

use serde::{Deserialize, Serialize};

/// Insight severity. Ordered so that `Critical > Warning > Info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which heuristic rule produced an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    AnomalyVolume,
    TopFeatures,
    ModelReliability,
    LowConfidence,
    ImputedValues,
    CostConcentration,
    CostTrend,
}

/// The number an insight is built on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportingMetric {
    pub name: String,
    pub value: f64,
}

/// One human-readable finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub severity: Severity,
    pub supporting_metric: SupportingMetric,
    pub narrative: String,
    /// Rule priority; lower sorts first within a severity
    pub priority: u8,
}

impl Insight {
    pub fn new(
        kind: InsightKind,
        severity: Severity,
        priority: u8,
        title: impl Into<String>,
        metric: (&str, f64),
        narrative: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            severity,
            supporting_metric: SupportingMetric {
                name: metric.0.to_string(),
                value: metric.1,
            },
            narrative: narrative.into(),
            priority,
        }
    }
}

/// Ordered insights: severity descending, then priority ascending.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InsightSet(Vec<Insight>);

impl InsightSet {
    /// Build a set, imposing the canonical ordering.
    pub fn from_unordered(mut insights: Vec<Insight>) -> Self {
        insights.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| a.priority.cmp(&b.priority))
        });
        Self(insights)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Insight> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn find(&self, kind: InsightKind) -> Option<&Insight> {
        self.0.iter().find(|i| i.kind == kind)
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.0.iter().filter(|i| i.severity == severity).count()
    }

    pub fn into_vec(self) -> Vec<Insight> {
        self.0
    }
}

impl<'a> IntoIterator for &'a InsightSet {
    type Item = &'a Insight;
    type IntoIter = std::slice::Iter<'a, Insight>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insight(kind: InsightKind, severity: Severity, priority: u8) -> Insight {
        Insight::new(kind, severity, priority, "t", ("m", 0.0), "n")
    }

    #[test]
    fn test_ordering_by_severity_then_priority() {
        let set = InsightSet::from_unordered(vec![
            insight(InsightKind::TopFeatures, Severity::Info, 1),
            insight(InsightKind::LowConfidence, Severity::Warning, 3),
            insight(InsightKind::AnomalyVolume, Severity::Critical, 1),
            insight(InsightKind::ModelReliability, Severity::Warning, 2),
        ]);
        let kinds: Vec<_> = set.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                InsightKind::AnomalyVolume,
                InsightKind::ModelReliability,
                InsightKind::LowConfidence,
                InsightKind::TopFeatures,
            ]
        );
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
