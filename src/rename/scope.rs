//! Scope resolution (first tree walk)
//!
//! Every SELECT root gets its own scope id, assigned in discovery order. Scope 0
//! is the statement level and only owns INSERT/CREATE targets. For each scope the
//! walk records the tables and table aliases of its FROM clause and the column
//! names and column aliases of its select list, plus the nodes whose names the
//! renamer has to revisit.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::{HiveRenameError, Result};
use crate::parser::labels::{
    COLUMN_ALIAS, COLUMN_EXPRESSION, COLUMN_NAMES, CREATE_EXPRESSION, FROM_EXPRESSION,
    INSERT_EXPRESSION, JOIN_CONDITION, TABLE_ALIAS, TABLE_EXPRESSION, TABLE_NAMES,
    TABLE_REFERENCE,
};
use crate::parser::{NodeId, ParseTree};

pub type ScopeId = usize;

/// What a table alias stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// A table named directly in the FROM clause
    Table(String),
    /// A subquery; `None` until the subquery's SELECT root has been entered
    Subquery(Option<ScopeId>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableBindings {
    /// Tables named directly in the FROM clause, first appearance order, no duplicates
    pub names: Vec<String>,
    pub alias: BTreeMap<String, TableSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnBindings {
    /// Column references in appearance order; duplicates kept
    pub names: Vec<String>,
    /// Column alias to the column name recorded just before it
    pub alias: BTreeMap<String, String>,
}

/// Bindings visible inside one SELECT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryScope {
    /// Scope the SELECT is nested in; `None` only for the statement level
    pub parent: Option<ScopeId>,
    pub tables: TableBindings,
    pub columns: ColumnBindings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeTable {
    scopes: BTreeMap<ScopeId, QueryScope>,
}

impl ScopeTable {
    pub fn get(&self, id: ScopeId) -> Option<&QueryScope> {
        self.scopes.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &QueryScope)> {
        self.scopes.iter().map(|(id, scope)| (*id, scope))
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut QueryScope {
        self.scopes.entry(id).or_default()
    }
}

impl fmt::Display for ScopeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, scope) in &self.scopes {
            match scope.parent {
                Some(parent) => writeln!(f, "scope {id} (in scope {parent})")?,
                None => writeln!(f, "scope {id}")?,
            }
            writeln!(f, "  tables: {:?}", scope.tables.names)?;
            for (alias, source) in &scope.tables.alias {
                match source {
                    TableSource::Table(name) => writeln!(f, "  table alias {alias} -> {name}")?,
                    TableSource::Subquery(Some(sub)) => {
                        writeln!(f, "  table alias {alias} -> subquery {sub}")?
                    }
                    TableSource::Subquery(None) => {
                        writeln!(f, "  table alias {alias} -> unbound subquery")?
                    }
                }
            }
            writeln!(f, "  columns: {:?}", scope.columns.names)?;
            for (alias, name) in &scope.columns.alias {
                writeln!(f, "  column alias {alias} -> {name}")?;
            }
        }
        Ok(())
    }
}

/// A node holding names to rename, and the scope its names resolve in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub node: NodeId,
    pub scope: ScopeId,
}

/// First tree walk: builds the [`ScopeTable`] and the reference list.
pub struct ScopeResolver<'a> {
    select_label: &'a str,
    scopes: ScopeTable,
    references: Vec<Reference>,
    /// Subquery aliases waiting for their SELECT root: (owning scope, alias)
    pending: Vec<(ScopeId, String)>,
    last_scope: ScopeId,
    resolved: bool,
}

impl<'a> ScopeResolver<'a> {
    pub fn new(select_label: &'a str) -> Self {
        Self {
            select_label,
            scopes: ScopeTable::default(),
            references: Vec::new(),
            pending: Vec::new(),
            last_scope: 0,
            resolved: false,
        }
    }

    /// Walk `tree`, merging schema-qualified table names in place.
    pub fn resolve(&mut self, tree: &mut ParseTree) -> Result<()> {
        let root = tree
            .root()
            .ok_or_else(|| HiveRenameError::precondition("cannot resolve an empty parse tree"))?;

        self.scopes = ScopeTable::default();
        self.references.clear();
        self.pending.clear();
        self.last_scope = 0;
        self.scopes.scope_mut(0);

        self.step(tree, None, root, 0);

        if let Some((scope, alias)) = self.pending.first() {
            debug!(scope, alias = alias.as_str(), "subquery alias never bound");
        }
        // Innermost scopes first; stable, so discovery order holds within a scope
        self.references.sort_by(|a, b| b.scope.cmp(&a.scope));
        self.resolved = true;
        Ok(())
    }

    pub fn scopes(&self) -> &ScopeTable {
        &self.scopes
    }

    /// Reference nodes, innermost scope first.
    pub fn references(&self) -> Result<&[Reference]> {
        if !self.resolved {
            return Err(HiveRenameError::precondition(
                "references requested before scope resolution",
            ));
        }
        Ok(&self.references)
    }

    pub fn into_scopes(self) -> ScopeTable {
        self.scopes
    }

    fn step(&mut self, tree: &mut ParseTree, parent: Option<NodeId>, node: NodeId, scope: ScopeId) {
        let Some(label) = tree.label(node).map(str::to_string) else {
            return;
        };
        let parent_label = parent.and_then(|p| tree.label(p)).map(str::to_string);
        let parent_label = parent_label.as_deref();

        if label == self.select_label {
            let inner = self.open_scope(scope);
            self.visit(tree, node, inner);
            return;
        }

        match label.as_str() {
            COLUMN_EXPRESSION => self.column_node(tree, node, scope),
            INSERT_EXPRESSION | CREATE_EXPRESSION => {
                let target = tree
                    .children(node)
                    .iter()
                    .copied()
                    .find(|c| tree.is(*c, TABLE_REFERENCE));
                if let Some(target) = target {
                    tree.merge_schema(target);
                }
                self.record(node, scope);
                self.visit(tree, node, scope);
            }
            TABLE_EXPRESSION => self.visit(tree, node, scope),
            _ if parent_label == Some(FROM_EXPRESSION) => self.column_node(tree, node, scope),
            JOIN_CONDITION if parent_label == Some(TABLE_EXPRESSION) => {
                self.column_node(tree, node, scope)
            }
            _ if parent_label == Some(TABLE_EXPRESSION) => {
                let mut last_table = None;
                let resume = self
                    .table_node(tree, node, scope, &mut last_table)
                    .unwrap_or(node);
                self.visit(tree, resume, scope);
            }
            _ => self.visit(tree, node, scope),
        }
    }

    fn visit(&mut self, tree: &mut ParseTree, node: NodeId, scope: ScopeId) {
        for child in tree.children(node).to_vec() {
            self.step(tree, Some(node), child, scope);
        }
    }

    fn open_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.last_scope += 1;
        let id = self.last_scope;
        self.scopes.scope_mut(id).parent = Some(parent);

        if let Some((owner, alias)) = self.pending.pop() {
            debug!(scope = id, owner, alias = alias.as_str(), "bound subquery alias");
            self.scopes
                .scope_mut(owner)
                .tables
                .alias
                .insert(alias, TableSource::Subquery(Some(id)));
        }
        id
    }

    fn record(&mut self, node: NodeId, scope: ScopeId) {
        self.references.push(Reference { node, scope });
    }

    fn column_node(&mut self, tree: &mut ParseTree, node: NodeId, scope: ScopeId) {
        self.record(node, scope);
        self.extract_columns(tree, node, scope);
        self.visit(tree, node, scope);
    }

    fn extract_columns(&mut self, tree: &ParseTree, node: NodeId, scope: ScopeId) {
        for child in tree.subtrees(node) {
            if tree.is(child, self.select_label) {
                continue;
            }
            if !tree.is(child, COLUMN_NAMES) {
                self.extract_columns(tree, child, scope);
                continue;
            }

            let columns = &mut self.scopes.scope_mut(scope).columns;
            if tree.is(node, COLUMN_ALIAS) {
                let alias = tree.text(child);
                match columns.names.last() {
                    Some(name) => {
                        columns.alias.insert(alias, name.clone());
                    }
                    None => debug!(scope, alias = alias.as_str(), "column alias without column"),
                }
            } else {
                let name: String = tree
                    .leaves(node)
                    .into_iter()
                    .filter(|leaf| !leaf.eq_ignore_ascii_case("DISTINCT"))
                    .collect();
                columns.names.push(name);
            }
        }
    }

    /// Classify the tables below one FROM item.
    ///
    /// Returns the node to resume the walk from when the item is a subquery.
    fn table_node(
        &mut self,
        tree: &mut ParseTree,
        node: NodeId,
        scope: ScopeId,
        last_table: &mut Option<String>,
    ) -> Option<NodeId> {
        tree.merge_schema(node);

        for child in tree.children(node).to_vec() {
            let Some(label) = tree.label(child).map(str::to_string) else {
                continue;
            };

            if label == self.select_label {
                self.register_subquery(tree, node, scope);
                return Some(node);
            }

            match label.as_str() {
                TABLE_NAMES if tree.is(node, TABLE_REFERENCE) => {
                    let name = tree.text(child);
                    let tables = &mut self.scopes.scope_mut(scope).tables;
                    if !tables.names.contains(&name) {
                        tables.names.push(name.clone());
                    }
                    *last_table = Some(name);
                    self.record(node, scope);
                }
                TABLE_NAMES if tree.is(node, TABLE_ALIAS) => {
                    let alias = tree.text(child);
                    let tables = &mut self.scopes.scope_mut(scope).tables;
                    let target = last_table.clone().or_else(|| tables.names.last().cloned());
                    match target {
                        Some(table) => {
                            tables
                                .alias
                                .entry(alias)
                                .or_insert(TableSource::Table(table));
                        }
                        None => debug!(scope, alias = alias.as_str(), "table alias without table"),
                    }
                }
                COLUMN_EXPRESSION | JOIN_CONDITION => {}
                _ => {
                    if let Some(resume) = self.table_node(tree, child, scope, last_table) {
                        return Some(resume);
                    }
                }
            }
        }

        None
    }

    fn register_subquery(&mut self, tree: &ParseTree, node: NodeId, scope: ScopeId) {
        let Some(&last) = tree.children(node).last() else {
            return;
        };
        if tree.is(last, self.select_label) {
            return;
        }

        let leaves = tree.leaves(last);
        let alias = match leaves.as_slice() {
            [alias] => alias.to_string(),
            [_, alias, ..] => alias.to_string(),
            [] => return,
        };

        debug!(scope, alias = alias.as_str(), "pending subquery alias");
        self.scopes
            .scope_mut(scope)
            .tables
            .alias
            .insert(alias.clone(), TableSource::Subquery(None));
        self.pending.push((scope, alias));
    }
}
