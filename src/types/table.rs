//! RawTable: the rectangular, typed result set produced by the ingestion layer.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A single scalar cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Date/time view of the cell. Text cells are parsed on demand.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(dt) => Some(*dt),
            Self::Text(s) => parse_datetime(s),
            _ => None,
        }
    }

    /// Label used when the cell is treated as a categorical level.
    ///
    /// Whole numbers print without a fractional part so that `101.0` and `101`
    /// land in the same category.
    pub fn category_label(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Self::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => Some(format!("{}", *v as i64)),
            Self::Number(v) => Some(v.to_string()),
            Self::Date(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

/// Declared storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    Date,
}

impl ColumnKind {
    fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::Numeric, Value::Number(_))
                | (Self::Text, Value::Text(_))
                | (Self::Date, Value::Date(_))
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Date => "date",
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, uniformly typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    /// Numeric column from optional values (`None` becomes `Value::Null`).
    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = Option<f64>>) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Number))
            .collect();
        Self::new(name, ColumnKind::Numeric, values)
    }

    /// Text column from optional values.
    pub fn text<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.map_or(Value::Null, |s| Value::Text(s.into())))
            .collect();
        Self::new(name, ColumnKind::Text, values)
    }

    /// Date column from optional values.
    pub fn dates(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<NaiveDateTime>>,
    ) -> Self {
        let values = values
            .into_iter()
            .map(|v| v.map_or(Value::Null, Value::Date))
            .collect();
        Self::new(name, ColumnKind::Date, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Iterator over non-null cells, in row order.
    pub fn non_null(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_null())
    }
}

/// Table construction errors
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Column '{column}' is declared {kind} but row {row} holds a different type")]
    TypeMismatch {
        column: String,
        kind: ColumnKind,
        row: usize,
    },
}

/// Ordered, rectangular collection of typed columns.
///
/// Produced once by the ingestion collaborator and never mutated by the core.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawTable {
    columns: Vec<Column>,
}

impl RawTable {
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let expected = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();

        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(TableError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != expected {
                return Err(TableError::RaggedColumn {
                    column: column.name.clone(),
                    expected,
                    actual: column.len(),
                });
            }
            if let Some(row) = column.values.iter().position(|v| !column.kind.accepts(v)) {
                return Err(TableError::TypeMismatch {
                    column: column.name.clone(),
                    kind: column.kind,
                    row,
                });
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Parse the date/time spellings commonly returned by SQL drivers and CSV exports.
///
/// Date-only values resolve to midnight. Returns `None` for anything else,
/// including bare numbers (epoch values are not guessed).
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = chrono::DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_utc());
    }

    for fmt in &[
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_table_accepted() {
        let table = RawTable::new(vec![
            Column::numeric("cost", [Some(1.0), None]),
            Column::text("equipment_id", [Some("EQ1"), Some("EQ2")]),
        ])
        .unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.column("cost").unwrap().null_count(), 1);
    }

    #[test]
    fn test_ragged_table_rejected() {
        let err = RawTable::new(vec![
            Column::numeric("cost", [Some(1.0), Some(2.0)]),
            Column::text("equipment_id", [Some("EQ1")]),
        ])
        .unwrap_err();
        assert!(matches!(err, TableError::RaggedColumn { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = RawTable::new(vec![
            Column::numeric("cost", [Some(1.0)]),
            Column::numeric("cost", [Some(2.0)]),
        ])
        .unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("cost".to_string()));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let column = Column::new(
            "cost",
            ColumnKind::Numeric,
            vec![Value::Number(1.0), Value::Text("oops".to_string())],
        );
        let err = RawTable::new(vec![column]).unwrap_err();
        assert!(matches!(err, TableError::TypeMismatch { row: 1, .. }));
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2024-01-15").is_some());
        assert!(parse_datetime("2024-01-15 08:30:00").is_some());
        assert!(parse_datetime("2024-01-15T08:30:00Z").is_some());
        assert!(parse_datetime("01/15/2024").is_some());
        assert!(parse_datetime("1705307400").is_none());
        assert!(parse_datetime("pump seal").is_none());
        assert!(parse_datetime("").is_none());
    }

    #[test]
    fn test_category_label_normalizes_whole_numbers() {
        assert_eq!(Value::Number(101.0).category_label().as_deref(), Some("101"));
        assert_eq!(Value::Number(1.5).category_label().as_deref(), Some("1.5"));
        assert_eq!(Value::Text("  EQ1 ".into()).category_label().as_deref(), Some("EQ1"));
        assert_eq!(Value::Text("   ".into()).category_label(), None);
        assert_eq!(Value::Null.category_label(), None);
    }
}
