//! Rename mapping: old table name to new table name and column renames

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{HiveRenameError, Result};

/// Field entry that stands for every column of a table; never a rename target.
const WILDCARD_FIELD: &str = "*";

/// Renames for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableMapping {
    pub new_name: String,
    /// Upper-cased old column name to new column name
    pub fields: HashMap<String, String>,
}

impl TableMapping {
    pub fn new<K, V>(new_name: impl Into<String>, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            new_name: new_name.into(),
            fields: fields
                .into_iter()
                .map(|(old, new)| (old.as_ref().to_uppercase(), new.into()))
                .collect(),
        }
    }

    /// New name of `column`, if the mapping renames it.
    pub fn field(&self, column: &str) -> Option<&str> {
        if column == WILDCARD_FIELD {
            return None;
        }
        self.fields
            .get(&column.to_uppercase())
            .filter(|new| new.as_str() != WILDCARD_FIELD)
            .map(String::as_str)
    }
}

/// One mapping file as stored on disk.
#[derive(Debug, Deserialize)]
struct MappingFile {
    #[serde(default)]
    old_name: Option<String>,
    new_name: String,
    #[serde(default)]
    fields: HashMap<String, String>,
}

/// Table renames keyed by upper-cased old table name.
#[derive(Debug, Clone, Default)]
pub struct RenameMapping {
    tables: HashMap<String, TableMapping>,
}

impl RenameMapping {
    pub fn from_tables<K: AsRef<str>>(tables: impl IntoIterator<Item = (K, TableMapping)>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|(old, mapping)| (old.as_ref().to_uppercase(), mapping))
                .collect(),
        }
    }

    /// Load every `*.json` file of `dir`, keyed by file stem.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(HiveRenameError::MappingDirNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut tables = HashMap::new();
        for entry in walkdir::WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let text = std::fs::read_to_string(path).map_err(|e| HiveRenameError::MappingRead {
                path: path.to_path_buf(),
                source: e,
            })?;
            let file: MappingFile =
                serde_json::from_str(&text).map_err(|e| HiveRenameError::MappingParse {
                    path: path.to_path_buf(),
                    source: e,
                })?;

            let key = stem.to_uppercase();
            if let Some(old_name) = file.old_name.as_deref() {
                if !old_name.eq_ignore_ascii_case(&key) {
                    debug!(file = %path.display(), old_name, "mapping keyed by file name");
                }
            }
            tables.insert(key, TableMapping::new(file.new_name, file.fields));
        }

        debug!(tables = tables.len(), dir = %dir.display(), "loaded rename mapping");
        Ok(Self { tables })
    }

    /// Mapping of a table, looked up case-insensitively.
    pub fn table(&self, name: &str) -> Option<&TableMapping> {
        self.tables.get(&name.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
