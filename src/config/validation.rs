//! Config validation: unknown-key detection with Levenshtein suggestions.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::BTreeSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, "; did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `AnalysisConfig`.
///
/// Any new field added to `AnalysisConfig` must be added here too.
pub fn known_config_keys() -> BTreeSet<&'static str> {
    let keys: &[&str] = &[
        // [classifier]
        "classifier",
        "classifier.sample_size",
        // [features]
        "features",
        "features.categorical_encoding",
        "features.max_one_hot_levels",
        // [model]
        "model",
        "model.holdout_ratio",
        "model.seed",
        "model.min_rows",
        "model.ridge_lambda",
        "model.permutation_repeats",
        // [anomaly]
        "anomaly",
        "anomaly.method",
        "anomaly.threshold_percentile",
        "anomaly.score_threshold",
        "anomaly.n_trees",
        "anomaly.subsample_size",
        // [insights]
        "insights",
        "insights.top_n_features",
        "insights.max_relative_error",
        "insights.critical_anomaly_fraction",
        "insights.critical_anomaly_score",
        "insights.max_flagged_identifiers",
        "insights.min_reliable_holdout",
        "insights.max_imputed_fraction",
        "insights.cost_concentration_warning",
        "insights.cost_trend_warning",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the alphabetically first key.
pub fn suggest_correction(unknown: &str, known: &BTreeSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (*k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        .min_by_key(|(_, dist)| *dist)
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("seed", "seed"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("holdout_ratoi", "holdout_ratio"), 2);
        assert_eq!(levenshtein("n_tree", "n_trees"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [model]
            seed = 1
            [anomaly]
            n_trees = 50
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"model".to_string()));
        assert!(keys.contains(&"model.seed".to_string()));
        assert!(keys.contains(&"anomaly.n_trees".to_string()));
    }

    #[test]
    fn test_unknown_key_gets_suggestion() {
        let warnings = validate_unknown_keys(
            r#"
            [model]
            holdout_ratoi = 0.3
            "#,
        );
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "model.holdout_ratoi");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("model.holdout_ratio"));
        assert!(warnings[0].to_string().contains("did you mean"));
    }

    #[test]
    fn test_known_keys_produce_no_warnings() {
        let warnings = validate_unknown_keys(
            r#"
            [model]
            seed = 3
            [insights]
            top_n_features = 5
            "#,
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_far_off_key_has_no_suggestion() {
        let warnings = validate_unknown_keys("completely_unrelated_setting = true\n");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].suggestion.is_none());
    }
}
