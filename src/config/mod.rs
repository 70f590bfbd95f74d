//! Analysis Configuration Module
//!
//! Provides the tunables for every pipeline stage, loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `MAINT_ANALYSIS_CONFIG` environment variable (path to TOML file)
//! 2. `analysis.toml` in the current working directory
//! 3. Built-in defaults (`defaults.rs`)
//!
//! ## Usage
//!
//! The config is an ordinary value threaded through each stage call, so
//! independent invocations never share settings or seeds:
//!
//! ```ignore
//! let config = AnalysisConfig::load();
//! let result = AnalysisPipeline::new(config).run(&table, &overrides)?;
//! ```

mod analysis_config;
pub mod defaults;
pub mod validation;

pub use analysis_config::*;
