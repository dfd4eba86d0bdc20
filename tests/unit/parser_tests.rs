//! Unit tests for query tokenizing and grammar-driven parsing

use std::io::Write;

use hive_rename::parser::{split_statements, tokenize, BaseGrammar, ChartParser};
use hive_rename::HiveRenameError;
use tempfile::NamedTempFile;

fn tokens(query: &str) -> Vec<String> {
    tokenize(query).tokens
}

// ============================================================================
// Tokenizer Tests
// ============================================================================

#[test]
fn test_tokenize_template_variables_and_double_quotes() {
    let tokenized = tokenize(r#"SELECT a FROM ${hivevar:db}.t WHERE b = "x y" AND c IN (1, 2)"#);

    assert_eq!(
        tokenized.tokens.join(" "),
        "SELECT A FROM #WORD# . T WHERE B = #WORD# AND C IN ( #WORD# , #WORD# )"
    );
    assert_eq!(tokenized.words, vec!["${hivevar:db}", "\"x y\"", "1", "2"]);
}

#[test]
fn test_tokenize_keeps_digits_inside_identifiers() {
    assert_eq!(
        tokens("select col1 from tabla2"),
        vec!["SELECT", "COL1", "FROM", "TABLA2"]
    );
}

#[test]
fn test_split_statements_skips_empty_statements() {
    let statements = split_statements("SELECT 1;;\n  ;\nSELECT 'a;b' FROM t");
    assert_eq!(statements.len(), 2);
    assert_eq!(statements[1].trim(), "SELECT 'a;b' FROM t");
}

// ============================================================================
// Grammar Tests
// ============================================================================

#[test]
fn test_hive_grammar_terminals() {
    let base = BaseGrammar::hive().unwrap();
    let terminals = base.terminals();

    for keyword in ["SELECT", "FROM", "WHERE", "JOIN", "ON", "AS", "#WORD#", "."] {
        assert!(terminals.contains(keyword), "missing terminal {keyword}");
    }
    assert!(!terminals.contains("T1"));
}

#[test]
fn test_augment_adds_query_identifiers_once() {
    let base = BaseGrammar::hive().unwrap();
    let grammar = base.augment(&tokens("SELECT x.a FROM db.t1 x WHERE a > 1"));

    assert_eq!(grammar.identifiers(), &["X", "A", "DB", "T1"]);
    // Base grammar is left untouched
    assert!(base.grammar().identifiers().is_empty());
}

#[test]
fn test_augment_is_rebuilt_per_query() {
    let base = BaseGrammar::hive().unwrap();
    let first = base.augment(&tokens("SELECT a FROM t1"));
    let second = base.augment(&tokens("SELECT b FROM t2"));

    assert_eq!(first.identifiers(), &["A", "T1"]);
    assert_eq!(second.identifiers(), &["B", "T2"]);
}

#[test]
fn test_custom_grammar_file() {
    let mut file = NamedTempFile::with_suffix(".cfg").unwrap();
    writeln!(file, "# minimal grammar").unwrap();
    writeln!(file, "S -> 'select' COLUMN_NAMES 'from' TABLE_NAMES").unwrap();
    writeln!(file, "   | 'select' '*' 'from' TABLE_NAMES").unwrap();
    file.flush().unwrap();

    let base = BaseGrammar::load(file.path()).unwrap();
    let query = tokens("SELECT a FROM t");
    let grammar = base.augment(&query);
    let tree = ChartParser::new(&grammar).parse(&query).unwrap();

    assert_eq!(
        tree.to_string(),
        "(S SELECT (COLUMN_NAMES A) FROM (TABLE_NAMES T))"
    );
}

#[test]
fn test_grammar_errors() {
    assert!(matches!(
        BaseGrammar::load(std::path::Path::new("/nonexistent/hive.cfg")),
        Err(HiveRenameError::GrammarRead { .. })
    ));

    match BaseGrammar::parse("S -> 'A' B\n") {
        Err(HiveRenameError::InvalidGrammar { line, message }) => {
            assert_eq!(line, 1);
            assert!(message.contains('B'), "unexpected message: {message}");
        }
        other => panic!("unexpected result: {other:?}"),
    }

    assert!(matches!(
        BaseGrammar::parse("S 'A'\n"),
        Err(HiveRenameError::InvalidGrammar { .. })
    ));
}

// ============================================================================
// Parser Tests
// ============================================================================

#[test]
fn test_parse_hive_query_shapes() {
    let base = BaseGrammar::hive().unwrap();
    let queries = [
        "SELECT DISTINCT a, b FROM t1 WHERE a IS NOT NULL ORDER BY b DESC LIMIT 10",
        "SELECT CASE WHEN a > 1 THEN 'x' ELSE 'y' END AS c FROM t1",
        "SELECT CAST(a AS DECIMAL(10, 2)) FROM t1",
        "SELECT a FROM t1 LEFT SEMI JOIN t2 ON t1.a = t2.a",
        "SELECT a FROM t1 WHERE EXISTS (SELECT b FROM t2 WHERE t2.b = t1.a)",
        "SELECT a, ROW_NUMBER() OVER (PARTITION BY a ORDER BY b) AS rn FROM t1",
        "CREATE TABLE IF NOT EXISTS t3 AS SELECT a FROM t1",
        "SELECT a FROM t1 UNION ALL SELECT a FROM t2",
    ];

    for query in queries {
        let tokens = tokens(query);
        let grammar = base.augment(&tokens);
        assert!(
            ChartParser::new(&grammar).parse(&tokens).is_some(),
            "failed to parse: {query}"
        );
    }
}

#[test]
fn test_parse_rejects_incomplete_query() {
    let base = BaseGrammar::hive().unwrap();
    let tokens = tokens("SELECT a FROM");
    let grammar = base.augment(&tokens);
    assert!(ChartParser::new(&grammar).parse(&tokens).is_none());
}
