//! Run configuration (JSON)

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{HiveRenameError, Result};
use crate::parser::labels::SELECT_SENTENCE;
use crate::parser::BaseGrammar;
use crate::pipeline::RenameSettings;
use crate::rename::RenameMapping;

/// Settings read from a configuration file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Grammar file; the bundled Hive grammar when absent
    #[serde(default)]
    pub grammar_file: Option<PathBuf>,
    /// Directory holding one mapping file per table
    pub mapping_dir: PathBuf,
    #[serde(default)]
    pub input_path: Option<PathBuf>,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// Non-terminal that opens a new scope
    #[serde(default = "default_select_label")]
    pub select_label: String,
    /// Lay out renamed queries with the formatter
    #[serde(default = "default_pretty")]
    pub pretty: bool,
    /// Glob matched against query file names, e.g. `*.hql`
    #[serde(default)]
    pub file_pattern: Option<String>,
}

fn default_select_label() -> String {
    SELECT_SENTENCE.to_string()
}

fn default_pretty() -> bool {
    true
}

impl Config {
    /// Read and validate a configuration file.
    ///
    /// Relative paths are taken from the directory of the configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HiveRenameError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config: Config =
            serde_json::from_str(&content).map_err(|e| HiveRenameError::ConfigParse {
                path: path.to_path_buf(),
                source: e,
            })?;

        let base_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(base_dir);
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base_dir.join(&*p);
            }
        };
        resolve(&mut self.mapping_dir);
        for path in [
            &mut self.grammar_file,
            &mut self.input_path,
            &mut self.output_path,
        ]
        .into_iter()
        .flatten()
        {
            resolve(path);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.select_label.trim().is_empty() {
            return Err(HiveRenameError::InvalidConfig {
                message: "select_label must not be empty".to_string(),
            });
        }
        if let Some(pattern) = &self.file_pattern {
            glob::Pattern::new(pattern).map_err(|e| HiveRenameError::InvalidConfig {
                message: format!("file_pattern '{pattern}': {e}"),
            })?;
        }
        Ok(())
    }

    pub fn base_grammar(&self) -> Result<BaseGrammar> {
        match &self.grammar_file {
            Some(path) => BaseGrammar::load(path),
            None => BaseGrammar::hive(),
        }
    }

    pub fn mapping(&self) -> Result<RenameMapping> {
        RenameMapping::load_dir(&self.mapping_dir)
    }

    pub fn settings(&self) -> RenameSettings {
        RenameSettings {
            select_label: self.select_label.clone(),
            pretty: self.pretty,
        }
    }
}
