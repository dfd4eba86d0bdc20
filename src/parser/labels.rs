//! Grammar symbol names the tree walks depend on.
//!
//! A custom grammar may use any other symbol names it likes, but these must keep
//! their meaning for scope resolution and renaming to work.

/// Default label of a SELECT statement; every node with this label opens a scope.
pub const SELECT_SENTENCE: &str = "SELECT_SENTENCE";
/// One item of a SELECT list, optionally aliased.
pub const COLUMN_EXPRESSION: &str = "COLUMN_EXPRESSION";
/// Alias of a SELECT list item.
pub const COLUMN_ALIAS: &str = "COLUMN_ALIAS";
/// A column, optionally qualified by its table (`T . C`).
pub const COLUMN_REFERENCE: &str = "COLUMN_REFERENCE";
/// `*` or `T . *` in a SELECT list.
pub const ALL_COLUMNS: &str = "ALL_COLUMNS";
/// FROM clause wrapper; its children other than the table list are column-bearing.
pub const FROM_EXPRESSION: &str = "FROM_EXPRESSION";
/// Table list of a FROM clause.
pub const TABLE_EXPRESSION: &str = "TABLE_EXPRESSION";
/// `ON ...` condition of a join.
pub const JOIN_CONDITION: &str = "JOIN_CONDITION";
/// A table reference, `name` or `schema . name`.
pub const TABLE_REFERENCE: &str = "TABLE_REFERENCE";
/// Alias of a table or subquery in a FROM clause.
pub const TABLE_ALIAS: &str = "TABLE_ALIAS";
/// Target of an `INSERT` statement.
pub const INSERT_EXPRESSION: &str = "INSERT_EXPRESSION";
/// Target of a `CREATE TABLE ... AS` statement.
pub const CREATE_EXPRESSION: &str = "CREATE_EXPRESSION";
/// Identifier production extended per query, read as a table name.
pub const TABLE_NAMES: &str = "TABLE_NAMES";
/// Identifier production extended per query, read as a column name.
pub const COLUMN_NAMES: &str = "COLUMN_NAMES";
/// Nodes whose opening parenthesis attaches to the word before it, as in `SUM(A)`.
pub const CALL_PARENTHESES: &[&str] = &["FUNCTION_ARGUMENTS", "CAST_EXPRESSION", "DATA_TYPE"];
