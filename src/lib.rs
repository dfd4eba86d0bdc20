//! hive-rename: rewrites Hive SQL queries to a new naming scheme
//!
//! Queries are parsed with a context-free grammar augmented with each query's
//! own identifiers. Table and column references are then resolved through the
//! query's scopes (aliases, subqueries, joins) and renamed through a mapping of
//! old to new table and column names.

pub mod batch;
pub mod config;
pub mod error;
pub mod format;
pub mod parser;
pub mod pipeline;
pub mod rename;
pub mod util;

use std::path::PathBuf;

use anyhow::{Context, Result};

pub use batch::{BatchContext, BatchReport, QueryFailure};
pub use config::Config;
pub use error::HiveRenameError;
pub use pipeline::{QueryRenamer, RenameSettings};
pub use rename::{RenameMapping, TableMapping};

/// Options for a batch rename run
#[derive(Debug, Clone)]
pub struct RenameOptions {
    /// Path to the JSON configuration file
    pub config_path: PathBuf,
    /// Input directory (overrides the configuration)
    pub input_path: Option<PathBuf>,
    /// Output directory (overrides the configuration)
    pub output_path: Option<PathBuf>,
}

/// Rename every query file of the configured input directory
pub fn rename_queries(options: RenameOptions) -> Result<BatchReport> {
    let config = Config::load(&options.config_path)?;

    let input = options
        .input_path
        .or_else(|| config.input_path.clone())
        .context("no input directory given on the command line or in the configuration")?;
    let output = options
        .output_path
        .or_else(|| config.output_path.clone())
        .context("no output directory given on the command line or in the configuration")?;

    let grammar = config.base_grammar()?;
    let mapping = config.mapping()?;
    let settings = config.settings();
    tracing::info!(
        tables = mapping.len(),
        productions = grammar.grammar().productions().len(),
        "loaded grammar and rename mapping"
    );

    let context = BatchContext {
        grammar: &grammar,
        mapping: &mapping,
        settings: &settings,
    };
    let report = batch::rename_directory(context, &input, &output, config.file_pattern.as_deref())?;

    Ok(report)
}
