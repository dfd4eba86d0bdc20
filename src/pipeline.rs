//! Per-query processing context
//!
//! A [`QueryRenamer`] runs one query at a time through tokenize, parse, scope
//! resolution, renaming and reconstruction. The base grammar and the mapping are
//! only borrowed, so one context per worker can share them read-only.

use tracing::debug;

use crate::error::{HiveRenameError, Result};
use crate::format::format_query;
use crate::parser::labels::{CALL_PARENTHESES, SELECT_SENTENCE};
use crate::parser::{
    tokenize, BaseGrammar, ChartParser, Grammar, NodeId, ParseTree, TokenizedQuery, PLACEHOLDER,
};
use crate::rename::{RenameMapping, Renamer, ScopeResolver, ScopeTable};

/// Settings shared by every query of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameSettings {
    /// Label of the non-terminal that opens a new scope
    pub select_label: String,
    /// Pass reconstructed text through [`format_query`]
    pub pretty: bool,
}

impl Default for RenameSettings {
    fn default() -> Self {
        Self {
            select_label: SELECT_SENTENCE.to_string(),
            pretty: true,
        }
    }
}

pub struct QueryRenamer<'a> {
    base: &'a BaseGrammar,
    mapping: &'a RenameMapping,
    settings: RenameSettings,
    query: TokenizedQuery,
    grammar: Option<Grammar>,
    tree: Option<ParseTree>,
    scopes: Option<ScopeTable>,
}

impl<'a> QueryRenamer<'a> {
    pub fn new(base: &'a BaseGrammar, mapping: &'a RenameMapping) -> Self {
        Self::with_settings(base, mapping, RenameSettings::default())
    }

    pub fn with_settings(
        base: &'a BaseGrammar,
        mapping: &'a RenameMapping,
        settings: RenameSettings,
    ) -> Self {
        Self {
            base,
            mapping,
            settings,
            query: TokenizedQuery::default(),
            grammar: None,
            tree: None,
            scopes: None,
        }
    }

    /// Tokenize and parse `text`, discarding everything left from the previous query.
    pub fn parse(&mut self, text: &str) -> Result<&ParseTree> {
        self.query = tokenize(text);
        self.grammar = None;
        self.tree = None;
        self.scopes = None;

        let grammar = self.base.augment(&self.query.tokens);
        debug!(
            tokens = self.query.tokens.len(),
            identifiers = grammar.identifiers().len(),
            "parsing query"
        );
        let tree = ChartParser::new(&grammar).parse(&self.query.tokens);
        self.grammar = Some(grammar);

        let tree = tree.ok_or_else(|| HiveRenameError::ParseFailure {
            tokens: self.query.tokens.join(" "),
        })?;
        Ok(&*self.tree.insert(tree))
    }

    /// Resolve scopes and rename the parsed tree in place.
    pub fn resolve_and_rename(&mut self) -> Result<&ParseTree> {
        if self.scopes.is_some() {
            return Err(HiveRenameError::precondition("query has already been renamed"));
        }
        let tree = self
            .tree
            .as_mut()
            .ok_or_else(|| HiveRenameError::precondition("resolve_and_rename called before parse"))?;

        let mut resolver = ScopeResolver::new(&self.settings.select_label);
        resolver.resolve(tree)?;
        let references = resolver.references()?.to_vec();
        debug!(
            scopes = resolver.scopes().len(),
            references = references.len(),
            "resolved scopes"
        );

        Renamer::new(self.mapping, resolver.scopes(), &self.settings.select_label)
            .rename(tree, &references)?;

        self.scopes = Some(resolver.into_scopes());
        Ok(&*tree)
    }

    /// Rebuild query text from the renamed tree.
    pub fn reconstruct(&self) -> Result<String> {
        let tree = self
            .tree
            .as_ref()
            .ok_or_else(|| HiveRenameError::precondition("reconstruct called before parse"))?;
        if self.scopes.is_none() {
            return Err(HiveRenameError::precondition(
                "reconstruct called before resolve_and_rename",
            ));
        }
        let root = tree
            .root()
            .ok_or_else(|| HiveRenameError::precondition("parse tree has no root"))?;

        let mut pieces = Vec::new();
        collect_pieces(tree, root, &mut pieces);
        let mut text = restore_words(&join_leaves(&pieces), &self.query.words);
        if self.settings.pretty {
            text = format_query(&text);
        }

        if self.query.comments.is_empty() {
            Ok(text)
        } else {
            Ok(format!("{}\n{}", self.query.comments.join("\n"), text))
        }
    }

    /// Parse, rename and reconstruct one query.
    pub fn process(&mut self, text: &str) -> Result<String> {
        self.parse(text)?;
        self.resolve_and_rename()?;
        self.reconstruct()
    }

    /// Comments removed from the current query.
    pub fn comments(&self) -> &[String] {
        &self.query.comments
    }

    /// Literals removed from the current query.
    pub fn words(&self) -> &[String] {
        &self.query.words
    }

    pub fn tokens(&self) -> &[String] {
        &self.query.tokens
    }

    /// Grammar augmented for the current query.
    pub fn grammar(&self) -> Option<&Grammar> {
        self.grammar.as_ref()
    }

    pub fn tree(&self) -> Option<&ParseTree> {
        self.tree.as_ref()
    }

    /// Scopes of the current query, once renamed.
    pub fn scopes(&self) -> Option<&ScopeTable> {
        self.scopes.as_ref()
    }
}

/// A leaf, and whether it attaches to the leaf before it.
type Piece<'t> = (&'t str, bool);

/// Leaves below `node` in order. The parenthesis opening a call's arguments
/// attaches to the function name.
fn collect_pieces<'t>(tree: &'t ParseTree, node: NodeId, out: &mut Vec<Piece<'t>>) {
    if let Some(value) = tree.leaf(node) {
        out.push((value, false));
        return;
    }
    let call = tree
        .label(node)
        .is_some_and(|label| CALL_PARENTHESES.contains(&label));
    for &child in tree.children(node) {
        match tree.leaf(child) {
            Some(value) => out.push((value, call && value == "(")),
            None => collect_pieces(tree, child, out),
        }
    }
}

/// Join tokens with single spaces, without spaces inside `( )` or around `.`
/// and before `,` or `;`.
fn join_leaves(pieces: &[Piece<'_>]) -> String {
    let mut out = String::new();
    let mut previous: Option<&str> = None;

    for &(leaf, attached) in pieces {
        if let Some(prev) = previous {
            let tight = attached
                || matches!(leaf, "," | ";" | ")" | ".")
                || matches!(prev, "(" | ".");
            if !tight {
                out.push(' ');
            }
        }
        out.push_str(leaf);
        previous = Some(leaf);
    }

    out
}

/// Put the extracted literals back, one per placeholder, in order.
fn restore_words(text: &str, words: &[String]) -> String {
    let mut pieces = text.split(PLACEHOLDER);
    let mut out = String::with_capacity(text.len());
    if let Some(first) = pieces.next() {
        out.push_str(first);
    }

    let mut words = words.iter();
    for piece in pieces {
        out.push_str(words.next().map_or(PLACEHOLDER, String::as_str));
        out.push_str(piece);
    }
    out
}
