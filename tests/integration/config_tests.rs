//! Configuration and mapping loading failures surfaced by a batch run

use std::fs;

use hive_rename::{HiveRenameError, RenameOptions};

use crate::common::TestContext;

fn downcast(err: &anyhow::Error) -> &HiveRenameError {
    err.downcast_ref::<HiveRenameError>()
        .unwrap_or_else(|| panic!("not a HiveRenameError: {err:#}"))
}

#[test]
fn test_missing_config_file() {
    let ctx = TestContext::with_fixture("basic");
    let err = hive_rename::rename_queries(RenameOptions {
        config_path: ctx.root.join("missing.json"),
        input_path: None,
        output_path: None,
    })
    .unwrap_err();

    match downcast(&err) {
        HiveRenameError::ConfigRead { path, .. } => assert!(path.ends_with("missing.json")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_mapping_directory() {
    let ctx = TestContext::with_fixture("basic");
    fs::remove_dir_all(ctx.root.join("mapping")).unwrap();

    let err = ctx.rename().unwrap_err();
    match downcast(&err) {
        HiveRenameError::MappingDirNotFound { path } => assert!(path.ends_with("mapping")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_mapping_file() {
    let ctx = TestContext::with_fixture("basic");
    fs::write(ctx.root.join("mapping").join("roto.json"), "{\"new_name\": ").unwrap();

    let err = ctx.rename().unwrap_err();
    match downcast(&err) {
        HiveRenameError::MappingParse { path, .. } => assert!(path.ends_with("roto.json")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_input_directory_setting() {
    let ctx = TestContext::with_fixture("basic");
    fs::write(ctx.config_path(), r#"{"mapping_dir": "mapping"}"#).unwrap();

    let err = ctx.rename().unwrap_err();
    assert!(
        err.to_string().contains("no input directory"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn test_custom_grammar_file_is_used() {
    let ctx = TestContext::with_fixture("basic");
    fs::write(ctx.root.join("broken.cfg"), "QUERY -> UNDEFINED\n").unwrap();
    fs::write(
        ctx.config_path(),
        r#"{"mapping_dir": "mapping", "input_path": "queries", "output_path": "output", "grammar_file": "broken.cfg"}"#,
    )
    .unwrap();

    let err = ctx.rename().unwrap_err();
    assert!(matches!(
        downcast(&err),
        HiveRenameError::InvalidGrammar { line: 1, .. }
    ));
}
