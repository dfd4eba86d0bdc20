//! Unit tests for scope-aware renaming through the public pipeline

use hive_rename::parser::BaseGrammar;
use hive_rename::{HiveRenameError, QueryRenamer, RenameMapping, RenameSettings};
use pretty_assertions::assert_eq;

use crate::common::sample_mapping;

fn plain() -> RenameSettings {
    RenameSettings {
        pretty: false,
        ..RenameSettings::default()
    }
}

fn rename_with(mapping: &RenameMapping, query: &str) -> Result<String, HiveRenameError> {
    let base = BaseGrammar::hive().unwrap();
    QueryRenamer::with_settings(&base, mapping, plain()).process(query)
}

fn rename(query: &str) -> String {
    rename_with(&sample_mapping(), query)
        .unwrap_or_else(|e| panic!("failed to rename {query}: {e}"))
}

// ============================================================================
// Round Trip and Idempotence
// ============================================================================

#[test]
fn test_unmapped_query_round_trips() {
    assert_eq!(
        rename("select a, b from otra where c = 'Valor' and d > 3"),
        "SELECT A, B FROM OTRA WHERE C = 'Valor' AND D > 3"
    );
}

#[test]
fn test_renaming_is_idempotent() {
    let once = rename("SELECT a, b FROM t1");
    assert_eq!(once, "SELECT A2, B2 FROM T2");
    assert_eq!(rename(&once), once);
}

// ============================================================================
// Aliases
// ============================================================================

#[test]
fn test_table_alias_surface_is_kept() {
    assert_eq!(rename("SELECT x.a FROM t1 AS x"), "SELECT X.A2 FROM T2 AS X");
    assert_eq!(
        rename("SELECT x.a FROM t1 x WHERE x.b = 1"),
        "SELECT X.A2 FROM T2 X WHERE X.B2 = 1"
    );
}

#[test]
fn test_column_alias_is_not_renamed_outside_select_list() {
    assert_eq!(
        rename("SELECT a AS b FROM t1 ORDER BY b"),
        "SELECT A2 AS B FROM T2 ORDER BY B"
    );
}

#[test]
fn test_qualified_wildcard_renames_table_only() {
    assert_eq!(rename("SELECT t1.* FROM t1"), "SELECT T2.* FROM T2");
    assert_eq!(rename("SELECT x.* FROM t1 x"), "SELECT X.* FROM T2 X");
}

// ============================================================================
// Subqueries
// ============================================================================

#[test]
fn test_subquery_propagation() {
    assert_eq!(
        rename("SELECT s.a FROM (SELECT a FROM T) AS s"),
        "SELECT S.new_a FROM (SELECT new_a FROM T2) AS S"
    );
}

#[test]
fn test_subquery_column_alias_is_kept() {
    assert_eq!(
        rename("SELECT total FROM (SELECT SUM(a) AS total FROM t1) s"),
        "SELECT TOTAL FROM (SELECT SUM(A2) AS TOTAL FROM T2) S"
    );
}

#[test]
fn test_in_subquery_has_its_own_scope() {
    assert_eq!(
        rename("SELECT a FROM t1 WHERE b IN (SELECT b FROM t3)"),
        "SELECT A2 FROM T2 WHERE B2 IN (SELECT B FROM T3)"
    );
}

#[test]
fn test_exists_subquery_sees_outer_alias() {
    assert_eq!(
        rename("SELECT x.a FROM t1 x WHERE EXISTS (SELECT c FROM otra WHERE otra.c = x.b)"),
        "SELECT X.A2 FROM T2 X WHERE EXISTS (SELECT C FROM OTRA WHERE OTRA.C = X.B2)"
    );
}

#[test]
fn test_in_subquery_sees_outer_alias() {
    assert_eq!(
        rename("SELECT a FROM t1 x WHERE b IN (SELECT y.c FROM otra y WHERE y.c = x.a)"),
        "SELECT A2 FROM T2 X WHERE B2 IN (SELECT Y.C FROM OTRA Y WHERE Y.C = X.A2)"
    );
}

#[test]
fn test_window_function_columns() {
    assert_eq!(
        rename("SELECT a, ROW_NUMBER() OVER (PARTITION BY a ORDER BY b) AS rn FROM t1"),
        "SELECT A2, ROW_NUMBER() OVER (PARTITION BY A2 ORDER BY B2) AS RN FROM T2"
    );
}

// ============================================================================
// Errors and Preservation
// ============================================================================

#[test]
fn test_ambiguous_unqualified_column() {
    match rename_with(&sample_mapping(), "SELECT a FROM T1, T2") {
        Err(HiveRenameError::UnresolvedTableReference { tables }) => {
            assert_eq!(tables, vec!["T1", "T2"])
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_unselected_subquery_column_with_two_source_tables() {
    match rename_with(&sample_mapping(), "SELECT s.z FROM (SELECT t1.a FROM t1, t2) s") {
        Err(HiveRenameError::UnresolvedTableReference { tables }) => {
            assert_eq!(tables, vec!["T1", "T2"])
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_qualified_columns_resolve_with_two_tables() {
    assert_eq!(
        rename("SELECT t1.a, otra.c FROM t1, otra"),
        "SELECT T2.A2, OTRA.C FROM T2, OTRA"
    );
}

#[test]
fn test_missing_field_keeps_original_name() {
    assert_eq!(rename("SELECT a, z FROM t1"), "SELECT A2, Z FROM T2");
}

#[test]
fn test_literals_and_comments_are_preserved() {
    assert_eq!(
        rename("SELECT a FROM t1 -- note\nWHERE d = '2020-01-01'"),
        "-- note\nSELECT A2 FROM T2 WHERE D = '2020-01-01'"
    );
}

#[test]
fn test_escaped_quote_in_literal() {
    assert_eq!(
        rename(r"SELECT a FROM t1 WHERE b = 'it\'s'"),
        r"SELECT A2 FROM T2 WHERE B2 = 'it\'s'"
    );
}

#[test]
fn test_trailing_semicolon_is_kept() {
    assert_eq!(rename("SELECT x.a FROM t1 x;"), "SELECT X.A2 FROM T2 X;");
}

#[test]
fn test_schema_qualified_table_is_merged() {
    assert_eq!(rename("SELECT a FROM schema.T1"), "SELECT A2 FROM NEW_T1");
}

#[test]
fn test_insert_target_is_renamed() {
    assert_eq!(
        rename("INSERT INTO TABLE t1 PARTITION (b = 'x') SELECT c FROM otra"),
        "INSERT INTO TABLE T2 PARTITION (B2 = 'x') SELECT C FROM OTRA"
    );
}

#[test]
fn test_pretty_output() {
    let base = BaseGrammar::hive().unwrap();
    let mapping = sample_mapping();
    let mut renamer = QueryRenamer::new(&base, &mapping);

    assert_eq!(
        renamer
            .process("select a from t1 where b = 'from #here' -- note")
            .unwrap(),
        "-- note\nSELECT A2\nFROM T2\nWHERE B2 = 'from #here'"
    );
}
