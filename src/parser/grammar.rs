//! Grammar loading and per-query augmentation
//!
//! The base grammar is written one rule per line in the form
//! `LHS -> 'TERMINAL' NONTERMINAL | ...`. A line starting with `|` continues the
//! alternatives of the previous rule and lines starting with `#` are comments.
//! Quoted terminals are upper-cased; the first rule's left-hand side is the start
//! symbol.
//!
//! The base grammar never names table or column identifiers. For every query,
//! [`BaseGrammar::augment`] returns a new [`Grammar`] whose `TABLE_NAMES` and
//! `COLUMN_NAMES` rules additionally accept every identifier found in the query.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use super::labels::{COLUMN_NAMES, TABLE_NAMES};
use crate::error::{HiveRenameError, Result};

/// Hive grammar shipped with the crate.
const HIVE_GRAMMAR: &str = include_str!("../../grammar/hive.cfg");

/// A grammar symbol. Non-terminals are interned indices into [`Grammar::name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(String),
    NonTerminal(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: usize,
    pub rhs: Vec<Symbol>,
}

/// A compiled context-free grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    names: Vec<String>,
    index: HashMap<String, usize>,
    productions: Vec<Production>,
    by_lhs: Vec<Vec<usize>>,
    start: usize,
    identifiers: Vec<String>,
}

impl Grammar {
    fn empty() -> Self {
        Self {
            names: Vec::new(),
            index: HashMap::new(),
            productions: Vec::new(),
            by_lhs: Vec::new(),
            start: 0,
            identifiers: Vec::new(),
        }
    }

    fn intern(&mut self, name: &str) -> usize {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        self.by_lhs.push(Vec::new());
        id
    }

    fn add_production(&mut self, lhs: usize, rhs: Vec<Symbol>) {
        self.by_lhs[lhs].push(self.productions.len());
        self.productions.push(Production { lhs, rhs });
    }

    pub fn start(&self) -> usize {
        self.start
    }

    /// Name of a non-terminal.
    pub fn name(&self, nonterminal: usize) -> &str {
        &self.names[nonterminal]
    }

    /// Interned id of a non-terminal, if the grammar defines or references it.
    pub fn symbol(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn production(&self, id: usize) -> &Production {
        &self.productions[id]
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Production ids of a non-terminal, in declaration order.
    pub fn productions_for(&self, nonterminal: usize) -> &[usize] {
        &self.by_lhs[nonterminal]
    }

    /// Identifiers added by [`BaseGrammar::augment`], in order of first appearance.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (lhs, productions) in self.by_lhs.iter().enumerate() {
            if productions.is_empty() {
                continue;
            }
            write!(f, "{} ->", self.names[lhs])?;
            for (i, &id) in productions.iter().enumerate() {
                if i > 0 {
                    write!(f, " |")?;
                }
                for symbol in &self.productions[id].rhs {
                    match symbol {
                        Symbol::Terminal(t) if t.contains('\'') => write!(f, " \"{t}\"")?,
                        Symbol::Terminal(t) => write!(f, " '{t}'")?,
                        Symbol::NonTerminal(nt) => write!(f, " {}", self.names[*nt])?,
                    }
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The static base grammar plus its terminal vocabulary.
#[derive(Debug, Clone)]
pub struct BaseGrammar {
    grammar: Grammar,
    terminals: HashSet<String>,
}

/// A symbol as written in the grammar text, before interning.
enum RawSymbol {
    Terminal(String),
    NonTerminal(String),
}

struct RawAlternative {
    line: usize,
    lhs: String,
    symbols: Vec<RawSymbol>,
}

impl BaseGrammar {
    /// The Hive grammar bundled with the crate.
    pub fn hive() -> Result<Self> {
        Self::parse(HIVE_GRAMMAR)
    }

    /// Read and compile a grammar file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| HiveRenameError::GrammarRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&text)
    }

    /// Compile grammar text.
    pub fn parse(text: &str) -> Result<Self> {
        let alternatives = read_alternatives(text)?;
        let Some(first) = alternatives.first() else {
            return Err(HiveRenameError::InvalidGrammar {
                line: 0,
                message: "grammar has no productions".to_string(),
            });
        };

        let mut grammar = Grammar::empty();
        grammar.start = grammar.intern(&first.lhs);
        for alternative in &alternatives {
            grammar.intern(&alternative.lhs);
        }
        // Always present so augmentation has somewhere to add identifiers
        grammar.intern(TABLE_NAMES);
        grammar.intern(COLUMN_NAMES);

        let mut terminals = HashSet::new();
        for alternative in alternatives {
            let lhs = grammar.intern(&alternative.lhs);
            let mut rhs = Vec::with_capacity(alternative.symbols.len());
            for symbol in alternative.symbols {
                match symbol {
                    RawSymbol::Terminal(t) => {
                        terminals.insert(t.clone());
                        rhs.push(Symbol::Terminal(t));
                    }
                    RawSymbol::NonTerminal(name) => match grammar.symbol(&name) {
                        Some(id) => rhs.push(Symbol::NonTerminal(id)),
                        None => {
                            return Err(HiveRenameError::InvalidGrammar {
                                line: alternative.line,
                                message: format!("undefined symbol {name}"),
                            })
                        }
                    },
                }
            }
            grammar.add_production(lhs, rhs);
        }

        Ok(Self { grammar, terminals })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Terminals written in the base grammar, upper-cased.
    pub fn terminals(&self) -> &HashSet<String> {
        &self.terminals
    }

    /// Build the grammar for one query.
    ///
    /// Every identifier-like token that is not a base terminal is accepted by
    /// both `TABLE_NAMES` and `COLUMN_NAMES`. A dotted token contributes each of
    /// its parts, since which part names a schema, a table or a column is only
    /// known after parsing. Bare punctuation never becomes an identifier.
    pub fn augment(&self, tokens: &[String]) -> Grammar {
        let mut grammar = self.grammar.clone();
        let table_names = grammar.intern(TABLE_NAMES);
        let column_names = grammar.intern(COLUMN_NAMES);

        let mut seen = HashSet::new();
        for token in tokens {
            if self.terminals.contains(token) {
                continue;
            }
            for part in token.split('.').filter(|part| is_identifier(part)) {
                if self.terminals.contains(part) || !seen.insert(part) {
                    continue;
                }
                grammar.add_production(table_names, vec![Symbol::Terminal(part.to_string())]);
                grammar.add_production(column_names, vec![Symbol::Terminal(part.to_string())]);
                grammar.identifiers.push(part.to_string());
            }
        }

        grammar
    }
}

fn read_alternatives(text: &str) -> Result<Vec<RawAlternative>> {
    let mut alternatives: Vec<RawAlternative> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (lhs, rhs) = if let Some(rest) = trimmed.strip_prefix('|') {
            let Some(previous) = alternatives.last() else {
                return Err(HiveRenameError::InvalidGrammar {
                    line,
                    message: "continuation line before any rule".to_string(),
                });
            };
            (previous.lhs.clone(), rest)
        } else {
            let Some((lhs, rhs)) = trimmed.split_once("->") else {
                return Err(HiveRenameError::InvalidGrammar {
                    line,
                    message: "expected `->`".to_string(),
                });
            };
            let lhs = lhs.trim();
            if lhs.is_empty() || !lhs.chars().all(is_symbol_char) {
                return Err(HiveRenameError::InvalidGrammar {
                    line,
                    message: format!("invalid rule name `{lhs}`"),
                });
            }
            (lhs.to_string(), rhs)
        };

        for symbols in split_alternatives(rhs, line)? {
            alternatives.push(RawAlternative {
                line,
                lhs: lhs.clone(),
                symbols,
            });
        }
    }

    Ok(alternatives)
}

fn is_identifier(token: &str) -> bool {
    token.chars().any(|c| c.is_alphanumeric() || c == '_')
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split the right-hand side of a rule into its `|`-separated alternatives.
fn split_alternatives(rhs: &str, line: usize) -> Result<Vec<Vec<RawSymbol>>> {
    let mut alternatives = Vec::new();
    let mut current = Vec::new();
    let mut chars = rhs.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '|' => alternatives.push(std::mem::take(&mut current)),
            '\'' | '"' => {
                let close = rhs[start + 1..].find(c).ok_or_else(|| {
                    HiveRenameError::InvalidGrammar {
                        line,
                        message: "unterminated terminal".to_string(),
                    }
                })?;
                let end = start + 1 + close;
                current.push(RawSymbol::Terminal(rhs[start + 1..end].to_uppercase()));
                while chars.next_if(|(i, _)| *i <= end).is_some() {}
            }
            c if is_symbol_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some((i, next)) = chars.next_if(|(_, next)| is_symbol_char(*next)) {
                    end = i + next.len_utf8();
                }
                current.push(RawSymbol::NonTerminal(rhs[start..end].to_string()));
            }
            other => {
                return Err(HiveRenameError::InvalidGrammar {
                    line,
                    message: format!("unexpected character `{other}`"),
                })
            }
        }
    }
    alternatives.push(current);

    if alternatives.iter().any(Vec::is_empty) {
        return Err(HiveRenameError::InvalidGrammar {
            line,
            message: "empty alternative".to_string(),
        });
    }

    Ok(alternatives)
}
