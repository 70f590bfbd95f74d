//! Maintenance Analyzer CLI
//!
//! Loads a maintenance CSV export, runs the adaptive analysis and writes a
//! timestamped JSON report.
//!
//! # Usage
//!
//! ```bash
//! # Analyse with default settings, report under ./reports
//! maintenance-analyzer work_orders.csv
//!
//! # Force roles the heuristics get wrong and tighten the anomaly cutoff
//! maintenance-analyzer work_orders.csv --role wo_ref=categorical --anomaly-percentile 95
//! ```
//!
//! # Environment Variables
//!
//! - `MAINT_ANALYSIS_CONFIG`: Path to an analysis TOML file (default: ./analysis.toml if present)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use maintenance_analyzer::ingest::{CsvTableSource, TableSource};
use maintenance_analyzer::report::{JsonReportEmitter, ReportEmitter};
use maintenance_analyzer::{AnalysisConfig, AnalysisPipeline, ColumnRole, RoleOverrides, Severity};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "maintenance-analyzer")]
#[command(about = "Adaptive equipment-maintenance cost analysis")]
#[command(version)]
struct CliArgs {
    /// CSV file with one maintenance event per row (header row required)
    input: PathBuf,

    /// Directory that receives report_<timestamp>/ folders
    #[arg(short, long, default_value = "reports")]
    output_dir: PathBuf,

    /// Analysis config file (overrides MAINT_ANALYSIS_CONFIG and ./analysis.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force a column's role, e.g. --role asset_ref=categorical (repeatable)
    #[arg(long = "role", value_name = "COLUMN=ROLE", value_parser = parse_role_override)]
    roles: Vec<(String, ColumnRole)>,

    /// Random seed for the holdout split and anomaly detection
    #[arg(long)]
    seed: Option<u64>,

    /// Share of rows held out for evaluation, in [0, 1)
    #[arg(long)]
    holdout_ratio: Option<f64>,

    /// Percentile of anomaly scores above which records are flagged
    #[arg(long)]
    anomaly_percentile: Option<f64>,

    /// Number of features named in the top-features insight
    #[arg(long)]
    top_features: Option<usize>,

    /// Minimum number of rows required to analyse
    #[arg(long)]
    min_rows: Option<usize>,
}

fn parse_role_override(s: &str) -> Result<(String, ColumnRole), String> {
    let (column, role) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=ROLE, got '{s}'"))?;
    let column = column.trim();
    if column.is_empty() {
        return Err(format!("missing column name in '{s}'"));
    }
    Ok((column.to_string(), role.parse()?))
}

impl CliArgs {
    /// Layer command-line overrides on top of the file/default config.
    fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(seed) = self.seed {
            config.model.seed = seed;
        }
        if let Some(ratio) = self.holdout_ratio {
            config.model.holdout_ratio = ratio;
        }
        if let Some(p) = self.anomaly_percentile {
            config.anomaly.threshold_percentile = p;
        }
        if let Some(n) = self.top_features {
            config.insights.top_n_features = n;
        }
        if let Some(n) = self.min_rows {
            config.model.min_rows = n;
        }
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::load(),
    };
    args.apply_overrides(&mut config);
    config
        .validate()
        .context("Invalid analysis settings after command-line overrides")?;

    let overrides: RoleOverrides = args.roles.iter().cloned().collect();

    let mut source = CsvTableSource::new(&args.input);
    let table = source
        .load()
        .with_context(|| format!("Failed to load {}", source.source_name()))?;

    let result = AnalysisPipeline::new(config)
        .run(&table, &overrides)
        .context("Analysis failed")?;

    for insight in &result.insights {
        match insight.severity {
            Severity::Critical | Severity::Warning => {
                warn!(severity = %insight.severity, "{}: {}", insight.title, insight.narrative);
            }
            Severity::Info => info!("{}: {}", insight.title, insight.narrative),
        }
    }

    let report_dir = JsonReportEmitter::new(&args.output_dir)
        .emit(&result)
        .context("Failed to write report")?;
    info!(dir = %report_dir.display(), "Analysis report ready");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_override() {
        assert_eq!(
            parse_role_override("asset_ref=categorical").unwrap(),
            ("asset_ref".to_string(), ColumnRole::CategoricalKey)
        );
        assert!(parse_role_override("asset_ref").is_err());
        assert!(parse_role_override("=cost").is_err());
        assert!(parse_role_override("x=bogus").is_err());
    }

    #[test]
    fn test_cli_overrides_applied() {
        let args = CliArgs::parse_from([
            "maintenance-analyzer",
            "data.csv",
            "--seed",
            "7",
            "--holdout-ratio",
            "0.3",
            "--min-rows",
            "20",
            "--role",
            "ref=cost",
        ]);
        let mut config = AnalysisConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.model.seed, 7);
        assert_eq!(config.model.holdout_ratio, 0.3);
        assert_eq!(config.model.min_rows, 20);
        assert_eq!(args.roles, vec![("ref".to_string(), ColumnRole::Cost)]);
        assert_eq!(args.output_dir, PathBuf::from("reports"));
    }
}
