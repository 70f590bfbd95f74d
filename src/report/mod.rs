//! Report emission.
//!
//! Renders a finished [`AnalysisResult`] to disk. Each run gets its own
//! timestamped directory under the configured output root:
//!
//! ```text
//! <output_dir>/report_<YYYYMMDD_HHMMSS>/insights.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use thiserror::Error;
use tracing::info;

use crate::types::AnalysisResult;

/// File name of the JSON document inside a report directory.
pub const REPORT_FILE: &str = "insights.json";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Report I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize analysis result: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Consumer of finished analysis results.
pub trait ReportEmitter {
    /// Write the report and return the directory it was written to.
    fn emit(&self, result: &AnalysisResult) -> Result<PathBuf, ReportError>;
}

/// Writes `insights.json` into a timestamped report directory.
#[derive(Debug, Clone)]
pub struct JsonReportEmitter {
    output_dir: PathBuf,
}

impl JsonReportEmitter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Directory a report stamped `at` is written to.
    pub fn report_dir(&self, at: NaiveDateTime) -> PathBuf {
        self.output_dir
            .join(format!("report_{}", at.format("%Y%m%d_%H%M%S")))
    }

    /// Emit with an explicit timestamp.
    pub fn emit_at(
        &self,
        result: &AnalysisResult,
        at: NaiveDateTime,
    ) -> Result<PathBuf, ReportError> {
        let dir = self.report_dir(at);
        fs::create_dir_all(&dir).map_err(|source| ReportError::Io {
            path: dir.clone(),
            source,
        })?;

        let json = result.to_json_pretty()?;
        let file = dir.join(REPORT_FILE);
        fs::write(&file, json).map_err(|source| ReportError::Io {
            path: file.clone(),
            source,
        })?;

        info!(
            path = %file.display(),
            insights = result.insights.len(),
            flagged = result.anomalies.flagged_count(),
            "Report written"
        );
        Ok(dir)
    }
}

impl ReportEmitter for JsonReportEmitter {
    fn emit(&self, result: &AnalysisResult) -> Result<PathBuf, ReportError> {
        self.emit_at(result, Local::now().naive_local())
    }
}
