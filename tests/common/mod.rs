//! Common test utilities for hive-rename tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use hive_rename::{BatchReport, RenameMapping, RenameOptions, TableMapping};
use tempfile::TempDir;

/// Test context with temporary directory for isolated test execution
pub struct TestContext {
    /// Kept to prevent temp directory cleanup until TestContext is dropped
    _temp_dir: TempDir,
    pub root: PathBuf,
    /// Stored for debugging purposes
    _fixture_name: String,
}

impl TestContext {
    /// Create a new test context by copying a fixture to a temp directory
    pub fn with_fixture(fixture_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(fixture_name);

        let root = temp_dir.path().to_path_buf();

        // Copy fixture to temp directory
        copy_dir_recursive(&fixture_path, &root).expect("Failed to copy fixture");

        Self {
            _temp_dir: temp_dir,
            root,
            _fixture_name: fixture_name.to_string(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    /// Run the batch with the fixture's configuration
    pub fn rename(&self) -> anyhow::Result<BatchReport> {
        hive_rename::rename_queries(RenameOptions {
            config_path: self.config_path(),
            input_path: None,
            output_path: None,
        })
    }

    /// Run the batch and return the report, panicking if the run itself fails.
    pub fn rename_successfully(&self) -> BatchReport {
        match self.rename() {
            Ok(report) => report,
            Err(e) => panic!(
                "Rename failed for fixture '{}': {:#}",
                self._fixture_name, e
            ),
        }
    }

    /// Read a renamed file from the output directory
    pub fn read_output(&self, name: &str) -> String {
        let path = self.output_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read output {}: {}", path.display(), e))
    }
}

/// Mapping used by tests that do not go through the file system:
/// `T1 -> T2` with `A -> A2`, `B -> B2`, and `SCHEMA.T1 -> NEW_T1` with `A -> A2`.
pub fn sample_mapping() -> RenameMapping {
    RenameMapping::from_tables([
        (
            "T1",
            TableMapping::new("T2", [("A", "A2"), ("B", "B2"), ("*", "*")]),
        ),
        ("SCHEMA.T1", TableMapping::new("NEW_T1", [("A", "A2")])),
        ("T", TableMapping::new("T2", [("A", "new_a")])),
    ])
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    if !dst.exists() {
        fs::create_dir_all(dst)?;
    }

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }

    Ok(())
}
