//! Error types for hive-rename

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while renaming Hive queries
#[derive(Error, Debug)]
pub enum HiveRenameError {
    #[error("Failed to read configuration file: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file: {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to read grammar file: {path}")]
    GrammarRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid grammar at line {line}: {message}")]
    InvalidGrammar { line: usize, message: String },

    #[error("Mapping directory not found: {path}")]
    MappingDirNotFound { path: PathBuf },

    #[error("Failed to read mapping file: {path}")]
    MappingRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse mapping file: {path}")]
    MappingParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No derivation found for query: {tokens}")]
    ParseFailure { tokens: String },

    #[error(
        "Column without table qualifier but the query references {} tables: {tables:?}",
        tables.len()
    )]
    UnresolvedTableReference { tables: Vec<String> },

    #[error("{message}")]
    Precondition { message: String },

    #[error("Failed to read query file: {path}")]
    QueryFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write renamed queries to {path}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HiveRenameError {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        HiveRenameError::Precondition {
            message: message.into(),
        }
    }
}

/// Result alias used throughout the library
pub type Result<T, E = HiveRenameError> = std::result::Result<T, E>;
