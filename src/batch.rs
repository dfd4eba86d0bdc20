//! Batch renaming of query files
//!
//! Reads every query file of an input directory, splits it into statements,
//! renames each statement with its own [`QueryRenamer`] and writes the result
//! under the same file name in the output directory. Statements that fail are
//! written back unchanged and reported in the [`BatchReport`].

use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1252;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{HiveRenameError, Result};
use crate::parser::{split_statements, BaseGrammar};
use crate::pipeline::{QueryRenamer, RenameSettings};
use crate::rename::RenameMapping;

/// Minimum number of files to benefit from parallel processing.
/// Below this threshold, sequential processing is faster due to rayon overhead.
const PARALLEL_THRESHOLD: usize = 8;

/// Written after every renamed statement.
const STATEMENT_TERMINATOR: &str = "\n;\n\n";

/// A statement that could not be renamed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailure {
    pub file: PathBuf,
    /// Zero-based statement index within the file
    pub statement: usize,
    pub message: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Files written
    pub files: usize,
    /// Statements renamed successfully
    pub processed: usize,
    pub failures: Vec<QueryFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: BatchReport) {
        self.files += other.files;
        self.processed += other.processed;
        self.failures.extend(other.failures);
    }
}

/// Shared read-only state of a batch run
#[derive(Debug, Clone, Copy)]
pub struct BatchContext<'a> {
    pub grammar: &'a BaseGrammar,
    pub mapping: &'a RenameMapping,
    pub settings: &'a RenameSettings,
}

/// Read a file as UTF-8, falling back to Windows-1252, without a leading BOM.
pub fn read_query_file(path: &Path) -> Result<String> {
    read_file_with_encoding_fallback(path)
        .map(|content| match content.strip_prefix('\u{FEFF}') {
            Some(stripped) => stripped.to_string(),
            None => content,
        })
        .map_err(|e| HiveRenameError::QueryFileRead {
            path: path.to_path_buf(),
            source: e,
        })
}

fn read_file_with_encoding_fallback(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "File contains invalid characters",
                ))
            } else {
                Ok(decoded.into_owned())
            }
        }
    }
}

/// Regular files directly under `dir`, optionally filtered by a file name glob, sorted by name.
pub fn collect_query_files(dir: &Path, pattern: Option<&str>) -> Result<Vec<PathBuf>> {
    let matcher = pattern
        .map(glob::Pattern::new)
        .transpose()
        .map_err(|e| HiveRenameError::InvalidConfig {
            message: format!("file_pattern: {e}"),
        })?;

    let files = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            matcher.as_ref().map_or(true, |m| {
                entry.file_name().to_str().is_some_and(|name| m.matches(name))
            })
        })
        .map(|entry| entry.into_path())
        .collect();

    Ok(files)
}

/// Rename every statement of `input`, writing the result to `output`.
pub fn rename_file(context: BatchContext<'_>, input: &Path, output: &Path) -> Result<BatchReport> {
    let content = read_query_file(input)?;
    let mut report = BatchReport::default();
    let mut renamed = String::with_capacity(content.len() + 64);

    for (index, statement) in split_statements(&content).iter().enumerate() {
        let statement = statement.trim();
        let mut renamer =
            QueryRenamer::with_settings(context.grammar, context.mapping, context.settings.clone());

        match renamer.process(statement) {
            Ok(text) => {
                report.processed += 1;
                renamed.push_str(&text);
            }
            Err(e) => {
                warn!(file = %input.display(), statement = index, error = %e, "query not renamed");
                report.failures.push(QueryFailure {
                    file: input.to_path_buf(),
                    statement: index,
                    message: e.to_string(),
                });
                renamed.push_str(statement);
            }
        }
        renamed.push_str(STATEMENT_TERMINATOR);
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| HiveRenameError::OutputWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(output, renamed).map_err(|e| HiveRenameError::OutputWrite {
        path: output.to_path_buf(),
        source: e,
    })?;

    debug!(
        file = %input.display(),
        processed = report.processed,
        failed = report.failures.len(),
        "renamed file"
    );
    report.files = 1;
    Ok(report)
}

/// Rename every query file of `input_dir` into `output_dir`.
///
/// Files are processed in parallel for larger sets. Read and write errors abort
/// the run; statements that fail to rename only go into the report.
pub fn rename_directory(
    context: BatchContext<'_>,
    input_dir: &Path,
    output_dir: &Path,
    pattern: Option<&str>,
) -> Result<BatchReport> {
    let files = collect_query_files(input_dir, pattern)?;
    info!(files = files.len(), input = %input_dir.display(), "renaming query files");

    let rename_one = |file: &PathBuf| {
        let output = match file.file_name() {
            Some(name) => output_dir.join(name),
            None => output_dir.to_path_buf(),
        };
        rename_file(context, file, &output)
    };

    let results: Vec<Result<BatchReport>> = if files.len() >= PARALLEL_THRESHOLD {
        files.par_iter().map(rename_one).collect()
    } else {
        files.iter().map(rename_one).collect()
    };

    let mut report = BatchReport::default();
    for result in results {
        report.merge(result?);
    }

    info!(
        files = report.files,
        processed = report.processed,
        failed = report.failures.len(),
        "batch finished"
    );
    Ok(report)
}
