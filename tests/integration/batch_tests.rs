//! Batch renaming tests over fixture directories

use std::fs;

use hive_rename::batch::{rename_directory, rename_file};
use hive_rename::parser::BaseGrammar;
use hive_rename::{BatchContext, RenameMapping, RenameOptions, RenameSettings};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use crate::common::TestContext;

#[test]
fn test_rename_fixture_directory() {
    let ctx = TestContext::with_fixture("basic");
    let report = ctx.rename_successfully();

    assert_eq!(report.files, 3);
    assert_eq!(report.processed, 4);
    assert_eq!(report.failures.len(), 1);

    let failure = &report.failures[0];
    assert!(failure.file.ends_with("ambiguo.hql"));
    assert_eq!(failure.statement, 0);
    assert!(
        failure.message.contains("VENTAS") && failure.message.contains("CLIENTES"),
        "unexpected message: {}",
        failure.message
    );
}

#[test]
fn test_renamed_select_statements() {
    let ctx = TestContext::with_fixture("basic");
    ctx.rename_successfully();

    assert_eq!(
        ctx.read_output("informe.hql"),
        "-- resumen de ventas\n\
         SELECT customer_id, SUM(amount) AS TOTAL FROM sales \
         WHERE sale_date >= '2020-01-01' GROUP BY customer_id\n;\n\n\
         SELECT C.name, V.amount FROM customers C JOIN sales V \
         ON C.customer_id = V.customer_id\n;\n\n"
    );
}

#[test]
fn test_renamed_insert_target() {
    let ctx = TestContext::with_fixture("basic");
    ctx.rename_successfully();

    assert_eq!(
        ctx.read_output("carga.hql"),
        "INSERT OVERWRITE TABLE stg.orders PARTITION (order_id = 7) \
         SELECT V.customer_id FROM sales V\n;\n\n"
    );
}

#[test]
fn test_failed_statement_is_written_unchanged() {
    let ctx = TestContext::with_fixture("basic");
    ctx.rename_successfully();

    assert_eq!(
        ctx.read_output("ambiguo.hql"),
        "SELECT id_cliente FROM ventas, clientes\n;\n\nSELECT name FROM customers\n;\n\n"
    );
}

#[test]
fn test_files_outside_pattern_are_skipped() {
    let ctx = TestContext::with_fixture("basic");
    ctx.rename_successfully();

    assert!(!ctx.output_dir().join("README.txt").exists());
}

#[test]
fn test_command_line_directories_override_config() {
    let ctx = TestContext::with_fixture("basic");
    let input = ctx.root.join("otras");
    let output = ctx.root.join("salida");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("q.hql"), "SELECT nombre FROM clientes").unwrap();

    let report = hive_rename::rename_queries(RenameOptions {
        config_path: ctx.config_path(),
        input_path: Some(input),
        output_path: Some(output.clone()),
    })
    .unwrap();

    assert_eq!(report.files, 1);
    assert!(report.is_success());
    assert_eq!(
        fs::read_to_string(output.join("q.hql")).unwrap(),
        "SELECT name FROM customers\n;\n\n"
    );
    assert!(!ctx.output_dir().exists());
}

#[test]
fn test_parallel_directory_rename() {
    let ctx = TestContext::with_fixture("basic");
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    for i in 0..12 {
        fs::write(
            input.path().join(format!("q{i:02}.hql")),
            format!("SELECT importe, {i} FROM ventas;"),
        )
        .unwrap();
    }

    let grammar = BaseGrammar::hive().unwrap();
    let mapping = RenameMapping::load_dir(&ctx.root.join("mapping")).unwrap();
    let settings = RenameSettings {
        pretty: false,
        ..RenameSettings::default()
    };
    let context = BatchContext {
        grammar: &grammar,
        mapping: &mapping,
        settings: &settings,
    };

    let report = rename_directory(context, input.path(), output.path(), None).unwrap();
    assert_eq!(report.files, 12);
    assert_eq!(report.processed, 12);
    assert!(report.is_success());

    for i in 0..12 {
        let renamed = fs::read_to_string(output.path().join(format!("q{i:02}.hql"))).unwrap();
        assert_eq!(renamed, format!("SELECT amount, {i} FROM sales\n;\n\n"));
    }
}

#[test]
fn test_pretty_file_output() {
    let ctx = TestContext::with_fixture("basic");
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("consulta.hql");
    let output = dir.path().join("out").join("consulta.hql");
    fs::write(
        &input,
        "select importe from ventas where fecha = '2020' and importe > 10",
    )
    .unwrap();

    let grammar = BaseGrammar::hive().unwrap();
    let mapping = RenameMapping::load_dir(&ctx.root.join("mapping")).unwrap();
    let settings = RenameSettings::default();
    let context = BatchContext {
        grammar: &grammar,
        mapping: &mapping,
        settings: &settings,
    };

    let report = rename_file(context, &input, &output).unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "SELECT amount\nFROM sales\nWHERE sale_date = '2020' AND amount > 10\n;\n\n"
    );
}
