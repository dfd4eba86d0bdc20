//! Reference renaming (second tree walk)
//!
//! Visits the reference nodes recorded by the scope resolver, innermost scope
//! first, and rewrites table and column leaves through the [`RenameMapping`].
//! Table aliases keep their surface text; only the names behind them change.

use tracing::{debug, warn};

use super::mapping::RenameMapping;
use super::scope::{QueryScope, Reference, ScopeId, ScopeTable, TableSource};
use crate::error::{HiveRenameError, Result};
use crate::parser::labels::{
    ALL_COLUMNS, COLUMN_EXPRESSION, COLUMN_NAMES, COLUMN_REFERENCE, CREATE_EXPRESSION,
    INSERT_EXPRESSION, TABLE_NAMES, TABLE_REFERENCE,
};
use crate::parser::{NodeId, ParseTree};
use crate::util::{same_column, split_qualified};

pub struct Renamer<'a> {
    mapping: &'a RenameMapping,
    scopes: &'a ScopeTable,
    select_label: &'a str,
}

impl<'a> Renamer<'a> {
    pub fn new(mapping: &'a RenameMapping, scopes: &'a ScopeTable, select_label: &'a str) -> Self {
        Self {
            mapping,
            scopes,
            select_label,
        }
    }

    /// Rename every reference, in the order given.
    pub fn rename(&self, tree: &mut ParseTree, references: &[Reference]) -> Result<()> {
        for reference in references {
            let node = reference.node;
            if tree.is(node, INSERT_EXPRESSION) || tree.is(node, CREATE_EXPRESSION) {
                self.rename_target(tree, node);
            } else {
                let in_select_list = tree.is(node, COLUMN_EXPRESSION);
                self.rename_node(tree, node, reference.scope, in_select_list)?;
            }
        }
        Ok(())
    }

    fn rename_node(
        &self,
        tree: &mut ParseTree,
        node: NodeId,
        scope: ScopeId,
        in_select_list: bool,
    ) -> Result<()> {
        let Some(label) = tree.label(node).map(str::to_string) else {
            return Ok(());
        };
        if label == self.select_label {
            return Ok(());
        }

        match label.as_str() {
            COLUMN_REFERENCE => self.rename_column(tree, node, scope, in_select_list),
            ALL_COLUMNS => self.rename_all_columns(tree, node, scope),
            TABLE_REFERENCE => {
                self.rename_table_reference(tree, node);
                Ok(())
            }
            _ => {
                for child in tree.subtrees(node) {
                    self.rename_node(tree, child, scope, in_select_list)?;
                }
                Ok(())
            }
        }
    }

    fn rename_column(
        &self,
        tree: &mut ParseTree,
        node: NodeId,
        scope: ScopeId,
        in_select_list: bool,
    ) -> Result<()> {
        let children = tree.children(node).to_vec();
        match children.as_slice() {
            [table, _, column] if tree.is(*table, TABLE_NAMES) => {
                let table_name = tree.text(*table);
                let column_name = tree.text(*column);
                let (new_table, new_column) = self.resolve(&table_name, &column_name, scope)?;
                tree.set_first_leaf(*table, new_table);
                tree.set_first_leaf(*column, new_column);
            }
            [column] if tree.is(*column, COLUMN_NAMES) => {
                let name = tree.text(*column);
                let new_name = self.resolve_unqualified(&name, scope, in_select_list)?;
                tree.set_first_leaf(*column, new_name);
            }
            _ => debug!(node = node.index(), "unrecognised column reference shape"),
        }
        Ok(())
    }

    /// `T.*` only renames its table part.
    fn rename_all_columns(&self, tree: &mut ParseTree, node: NodeId, scope: ScopeId) -> Result<()> {
        if let Some(&table) = tree.children(node).first() {
            if tree.is(table, TABLE_NAMES) {
                let name = tree.text(table);
                let surface = self.table_surface(&name, scope)?;
                tree.set_first_leaf(table, surface);
            }
        }
        Ok(())
    }

    /// Rename a bare table reference, returning its name before renaming.
    fn rename_table_reference(&self, tree: &mut ParseTree, node: NodeId) -> Option<String> {
        tree.merge_schema(node);
        let table = tree
            .children(node)
            .iter()
            .copied()
            .find(|c| tree.is(*c, TABLE_NAMES))?;
        let name = tree.text(table);
        tree.set_first_leaf(table, self.table_name(&name));
        Some(name)
    }

    /// INSERT/CREATE target: the table and its partition or column list.
    fn rename_target(&self, tree: &mut ParseTree, node: NodeId) {
        let reference = tree
            .children(node)
            .iter()
            .copied()
            .find(|c| tree.is(*c, TABLE_REFERENCE));
        let Some(table) = reference.and_then(|r| self.rename_table_reference(tree, r)) else {
            debug!(node = node.index(), "target without table reference");
            return;
        };
        self.rename_target_columns(tree, node, &table);
    }

    fn rename_target_columns(&self, tree: &mut ParseTree, node: NodeId, table: &str) {
        for child in tree.subtrees(node) {
            if tree.is(child, self.select_label) || tree.is(child, TABLE_REFERENCE) {
                continue;
            }
            if tree.is(child, COLUMN_NAMES) {
                let column = tree.text(child);
                let new_column = self.field_name(table, &column);
                tree.set_first_leaf(child, new_column);
            } else {
                self.rename_target_columns(tree, child, table);
            }
        }
    }

    fn scope(&self, id: ScopeId) -> Result<&'a QueryScope> {
        self.scopes
            .get(id)
            .ok_or_else(|| HiveRenameError::precondition(format!("scope {id} was never resolved")))
    }

    /// Resolve `table.column` as seen from `scope` to its new surface text.
    pub fn resolve(&self, table: &str, column: &str, scope: ScopeId) -> Result<(String, String)> {
        match self.lookup_alias(table, scope)? {
            Some(TableSource::Table(real)) => {
                Ok((table.to_string(), self.field_name(real, column)))
            }
            Some(TableSource::Subquery(Some(inner))) => {
                Ok((table.to_string(), self.resolve_in_subquery(column, *inner)?))
            }
            Some(TableSource::Subquery(None)) => Err(HiveRenameError::precondition(format!(
                "subquery alias {table} was never bound to a scope"
            ))),
            None => Ok((self.table_name(table), self.field_name(table, column))),
        }
    }

    /// The alias `table` stands for, as seen from `scope`.
    ///
    /// Enclosing scopes are searched outwards, so a correlated subquery sees the
    /// aliases of the query around it. A table named directly in a scope hides
    /// any outer alias of the same name.
    fn lookup_alias(&self, table: &str, scope: ScopeId) -> Result<Option<&'a TableSource>> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let bindings = self.scope(id)?;
            if let Some(source) = bindings.tables.alias.get(table) {
                if id != scope {
                    debug!(table, scope, owner = id, "alias from enclosing scope");
                }
                return Ok(Some(source));
            }
            if bindings.tables.names.iter().any(|name| name == table) {
                return Ok(None);
            }
            current = bindings.parent;
        }
        Ok(None)
    }

    /// New name of `column` as exposed by the subquery of scope `inner`.
    fn resolve_in_subquery(&self, column: &str, inner: ScopeId) -> Result<String> {
        let bindings = self.scope(inner)?;
        if bindings.columns.alias.contains_key(column) {
            return Ok(column.to_string());
        }

        if let Some(name) = bindings
            .columns
            .names
            .iter()
            .find(|name| same_column(name, column))
        {
            let (_, resolved) = match split_qualified(name) {
                Some((table, qualified_column)) => self.resolve(table, qualified_column, inner)?,
                None => {
                    let table = unreferenced_table(bindings)?;
                    self.resolve(&table, name, inner)?
                }
            };
            return Ok(resolved);
        }

        // Not selected explicitly, e.g. `SELECT *`: go to the subquery's own table
        let table = unreferenced_table(bindings)?;
        let (_, resolved) = self.resolve(&table, column, inner)?;
        Ok(resolved)
    }

    /// Resolve a column written without a table qualifier.
    fn resolve_unqualified(&self, column: &str, scope: ScopeId, in_select_list: bool) -> Result<String> {
        let bindings = self.scope(scope)?;
        if !in_select_list && bindings.columns.alias.contains_key(column) {
            return Ok(column.to_string());
        }

        let table = unreferenced_table(bindings)?;
        let (_, resolved) = self.resolve(&table, column, scope)?;
        Ok(resolved)
    }

    /// Surface text of a table qualifier: aliases stay, table names are mapped.
    fn table_surface(&self, table: &str, scope: ScopeId) -> Result<String> {
        if self.lookup_alias(table, scope)?.is_some() {
            Ok(table.to_string())
        } else {
            Ok(self.table_name(table))
        }
    }

    fn table_name(&self, table: &str) -> String {
        match self.mapping.table(table) {
            Some(mapping) => mapping.new_name.clone(),
            None => {
                debug!(table, "table not in rename mapping");
                table.to_string()
            }
        }
    }

    fn field_name(&self, table: &str, column: &str) -> String {
        let Some(mapping) = self.mapping.table(table) else {
            return column.to_string();
        };
        match mapping.field(column) {
            Some(new_column) => new_column.to_string(),
            None => {
                if column != "*" {
                    warn!(table, column, "column not in rename mapping, keeping original name");
                }
                column.to_string()
            }
        }
    }
}

/// The one table an unqualified column can belong to.
///
/// With no direct tables, a single alias (usually a subquery) stands in.
fn unreferenced_table(bindings: &QueryScope) -> Result<String> {
    let tables = &bindings.tables;
    match tables.names.as_slice() {
        [table] => Ok(table.clone()),
        [] => {
            let aliases: Vec<String> = tables.alias.keys().cloned().collect();
            match aliases.as_slice() {
                [alias] => Ok(alias.clone()),
                _ => Err(HiveRenameError::UnresolvedTableReference { tables: aliases }),
            }
        }
        many => Err(HiveRenameError::UnresolvedTableReference {
            tables: many.to_vec(),
        }),
    }
}
