//! Headered CSV files as analysis tables.
//!
//! Column kinds are inferred from the cells: every non-null cell numeric →
//! `Numeric`, every non-null cell a recognised date/time → `Date`, anything
//! else → `Text`. Empty cells and `null` / `nan` / `na` (any case) are nulls.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{IngestError, TableSource};
use crate::types::{parse_datetime, Column, ColumnKind, RawTable, Value};

const NULL_TOKENS: [&str; 3] = ["null", "nan", "na"];

/// Reads a whole CSV file into a [`RawTable`].
pub struct CsvTableSource {
    path: PathBuf,
    name: String,
}

impl CsvTableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse CSV text from any reader. `name` is used in error messages.
    pub fn read_from<R: Read>(reader: R, name: &str) -> Result<RawTable, IngestError> {
        let csv_err = |source| IngestError::Csv {
            path: name.to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.to_string())
            .collect();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(IngestError::MissingHeader(name.to_string()));
        }

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for result in reader.records() {
            let record = result.map_err(csv_err)?;
            for (column, cell) in cells.iter_mut().zip(record.iter()) {
                column.push(cell.to_string());
            }
        }

        let columns: Vec<Column> = headers
            .into_iter()
            .zip(cells)
            .map(|(header, values)| infer_column(header, &values))
            .collect();
        for c in &columns {
            debug!(column = %c.name, kind = %c.kind, nulls = c.null_count(), "Column loaded");
        }

        RawTable::new(columns).map_err(|source| IngestError::Table {
            path: name.to_string(),
            source,
        })
    }
}

impl TableSource for CsvTableSource {
    fn load(&mut self) -> Result<RawTable, IngestError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IngestError::Csv {
            path: self.name.clone(),
            source: csv::Error::from(e),
        })?;
        let table = Self::read_from(file, &self.name)?;
        info!(
            source = %self.name,
            rows = table.row_count(),
            columns = table.column_count(),
            "CSV table loaded"
        );
        Ok(table)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// True for cells that stand for a missing value.
pub fn is_null_token(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || NULL_TOKENS.iter().any(|t| cell.eq_ignore_ascii_case(t))
}

/// Build a typed column from raw cell strings.
pub fn infer_column(name: impl Into<String>, cells: &[String]) -> Column {
    let present: Vec<&str> = cells
        .iter()
        .map(String::as_str)
        .filter(|c| !is_null_token(c))
        .collect();

    let numeric = !present.is_empty()
        && present
            .iter()
            .all(|c| c.parse::<f64>().map(f64::is_finite).unwrap_or(false));
    let temporal = !numeric
        && !present.is_empty()
        && present.iter().all(|c| parse_datetime(c).is_some());

    let cell_value = |cell: &String| -> Value {
        if is_null_token(cell) {
            return Value::Null;
        }
        if numeric {
            cell.parse::<f64>().map(Value::Number).unwrap_or(Value::Null)
        } else if temporal {
            parse_datetime(cell).map(Value::Date).unwrap_or(Value::Null)
        } else {
            Value::Text(cell.clone())
        }
    };

    let kind = if numeric {
        ColumnKind::Numeric
    } else if temporal {
        ColumnKind::Date
    } else {
        ColumnKind::Text
    };
    Column::new(name, kind, cells.iter().map(cell_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
equipment_id,maintenance_date,maintenance_cost,notes
EQ1,2024-01-05,120.5,oil change
EQ2,2024-01-09,NA,
EQ1,2024-02-11 08:30:00,99,belt
";

    #[test]
    fn test_kind_inference() {
        let table = CsvTableSource::read_from(SAMPLE.as_bytes(), "sample").unwrap();
        assert_eq!(table.row_count(), 3);

        let kinds: Vec<ColumnKind> = table.columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Text,
                ColumnKind::Date,
                ColumnKind::Numeric,
                ColumnKind::Text
            ]
        );
    }

    #[test]
    fn test_null_tokens_become_null() {
        let table = CsvTableSource::read_from(SAMPLE.as_bytes(), "sample").unwrap();
        let cost = table.column("maintenance_cost").unwrap();
        assert_eq!(cost.values[1], Value::Null);
        assert_eq!(cost.values[2], Value::Number(99.0));
        assert_eq!(table.column("notes").unwrap().null_count(), 1);
        assert!(is_null_token(" NaN "));
        assert!(!is_null_token("n/a"));
    }

    #[test]
    fn test_mixed_column_is_text() {
        let column = infer_column(
            "asset",
            &["12".to_string(), "pump".to_string(), String::new()],
        );
        assert_eq!(column.kind, ColumnKind::Text);
        assert_eq!(column.values[0], Value::Text("12".into()));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = CsvTableSource::read_from("a,b\n1,2\n3\n".as_bytes(), "ragged").unwrap_err();
        assert!(matches!(err, IngestError::Csv { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let mut source = CsvTableSource::new(file.path());
        let table = source.load().unwrap();
        assert_eq!(table.column_count(), 4);
        assert_eq!(source.source_name(), file.path().display().to_string());
    }

    #[test]
    fn test_missing_file_is_csv_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = CsvTableSource::new(dir.path().join("absent.csv"));
        assert!(matches!(source.load(), Err(IngestError::Csv { .. })));
    }
}
