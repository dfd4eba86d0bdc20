//! Shared utility helpers.

/// Returns the part of a possibly qualified name after its last `.`.
#[inline]
pub fn unqualified(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, column)| column)
}

/// Splits `table.column` into its table and column parts.
///
/// Only the last `.` separates the column, so `schema.table.column` yields
/// (`schema.table`, `column`). Returns `None` for unqualified names.
#[inline]
pub fn split_qualified(name: &str) -> Option<(&str, &str)> {
    name.rsplit_once('.')
}

/// Case-insensitive comparison of two column references ignoring their table part.
///
/// `T1.A`, `t2.a` and `a` all name the same column.
#[inline]
pub fn same_column(a: &str, b: &str) -> bool {
    unqualified(a).eq_ignore_ascii_case(unqualified(b))
}
