//! Earley chart parser
//!
//! Recognition fills one chart column per input position. Prediction only adds
//! productions that can start at the next token, which keeps the identifier
//! rules added per query from flooding every column. Grammars are free of empty
//! alternatives, so a completed item always spans at least one token.
//!
//! The tree is built afterwards from the completed spans: productions are tried
//! in declaration order and, inside a production, each child takes the shortest
//! span that still lets the remaining children cover the rest of the input.
//! The first tree found this way is returned.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::grammar::{Grammar, Symbol};
use super::tree::{NodeId, ParseTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Item {
    production: usize,
    dot: usize,
    origin: usize,
}

/// Parser over one (augmented) grammar.
pub struct ChartParser<'g> {
    grammar: &'g Grammar,
}

impl<'g> ChartParser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self { grammar }
    }

    /// Parse `tokens`, returning the first derivation rooted at the start symbol.
    pub fn parse(&self, tokens: &[String]) -> Option<ParseTree> {
        if tokens.is_empty() {
            return None;
        }

        let chart = self.recognize(tokens);
        let start = self.grammar.start();
        if !chart.spans.contains(&(start, 0, tokens.len())) {
            debug!(tokens = tokens.len(), "no derivation covers the input");
            return None;
        }

        let mut builder = TreeBuilder {
            grammar: self.grammar,
            tokens,
            chart: &chart,
            feasible: HashMap::new(),
            in_progress: HashSet::new(),
            tree: ParseTree::new(),
        };
        let root = builder.build(start, 0, tokens.len())?;
        builder.tree.set_root(root);
        Some(builder.tree)
    }

    fn recognize(&self, tokens: &[String]) -> Chart {
        let n = tokens.len();
        let mut columns: Vec<Vec<Item>> = vec![Vec::new(); n + 1];
        let mut seen: Vec<HashSet<Item>> = vec![HashSet::new(); n + 1];
        // waiting[k][nt]: items at column k with the dot before non-terminal nt
        let mut waiting: Vec<HashMap<usize, Vec<Item>>> = vec![HashMap::new(); n + 1];
        let mut chart = Chart::default();

        let mut predicted: HashSet<usize> = HashSet::new();
        self.predict(self.grammar.start(), 0, tokens, &mut columns[0], &mut seen[0]);
        predicted.insert(self.grammar.start());

        for k in 0..=n {
            if k > 0 {
                predicted.clear();
            }
            let mut i = 0;
            while i < columns[k].len() {
                let item = columns[k][i];
                i += 1;
                let production = self.grammar.production(item.production);

                match production.rhs.get(item.dot) {
                    None => {
                        chart.completed.insert((item.production, item.origin, k));
                        chart.spans.insert((production.lhs, item.origin, k));
                        if let Some(parents) = waiting[item.origin].get(&production.lhs) {
                            for parent in parents {
                                let advanced = Item {
                                    dot: parent.dot + 1,
                                    ..*parent
                                };
                                if seen[k].insert(advanced) {
                                    columns[k].push(advanced);
                                }
                            }
                        }
                    }
                    Some(Symbol::Terminal(terminal)) => {
                        if k < n && tokens[k] == *terminal {
                            let advanced = Item {
                                dot: item.dot + 1,
                                ..item
                            };
                            if seen[k + 1].insert(advanced) {
                                columns[k + 1].push(advanced);
                            }
                        }
                    }
                    Some(Symbol::NonTerminal(nt)) => {
                        waiting[k].entry(*nt).or_default().push(item);
                        if predicted.insert(*nt) {
                            self.predict(*nt, k, tokens, &mut columns[k], &mut seen[k]);
                        }
                    }
                }
            }
        }

        chart
    }

    fn predict(
        &self,
        nonterminal: usize,
        k: usize,
        tokens: &[String],
        column: &mut Vec<Item>,
        seen: &mut HashSet<Item>,
    ) {
        for &production in self.grammar.productions_for(nonterminal) {
            if let Some(Symbol::Terminal(first)) = self.grammar.production(production).rhs.first() {
                if tokens.get(k) != Some(first) {
                    continue;
                }
            }
            let item = Item {
                production,
                dot: 0,
                origin: k,
            };
            if seen.insert(item) {
                column.push(item);
            }
        }
    }
}

#[derive(Debug, Default)]
struct Chart {
    /// (production, start, end) for every completed item
    completed: HashSet<(usize, usize, usize)>,
    /// (non-terminal, start, end) for every recognised span
    spans: HashSet<(usize, usize, usize)>,
}

struct TreeBuilder<'a> {
    grammar: &'a Grammar,
    tokens: &'a [String],
    chart: &'a Chart,
    feasible: HashMap<(usize, usize, usize, usize), bool>,
    in_progress: HashSet<(usize, usize, usize)>,
    tree: ParseTree,
}

impl TreeBuilder<'_> {
    fn build(&mut self, nonterminal: usize, start: usize, end: usize) -> Option<NodeId> {
        if !self.in_progress.insert((nonterminal, start, end)) {
            return None;
        }

        let grammar = self.grammar;
        let mut found = None;
        for &production in grammar.productions_for(nonterminal) {
            if !self.chart.completed.contains(&(production, start, end)) {
                continue;
            }
            if let Some(node) = self.expand(production, start, end) {
                found = Some(node);
                break;
            }
        }

        self.in_progress.remove(&(nonterminal, start, end));
        found
    }

    fn expand(&mut self, production: usize, start: usize, end: usize) -> Option<NodeId> {
        let grammar = self.grammar;
        let rhs = &grammar.production(production).rhs;
        let mut children = Vec::with_capacity(rhs.len());
        let mut pos = start;

        for (idx, symbol) in rhs.iter().enumerate() {
            match symbol {
                Symbol::Terminal(_) => {
                    children.push(self.tree.add_leaf(self.tokens[pos].as_str()));
                    pos += 1;
                }
                Symbol::NonTerminal(nt) => {
                    let remaining = rhs.len() - idx - 1;
                    let last = end.checked_sub(remaining)?;
                    let mid = (pos + 1..=last).find(|&mid| {
                        self.chart.spans.contains(&(*nt, pos, mid))
                            && self.feasible(production, idx + 1, mid, end)
                    })?;
                    children.push(self.build(*nt, pos, mid)?);
                    pos = mid;
                }
            }
        }

        let label = grammar.name(grammar.production(production).lhs);
        Some(self.tree.add_branch(label, children))
    }

    /// Whether `rhs[idx..]` of `production` can derive `tokens[pos..end]`.
    fn feasible(&mut self, production: usize, idx: usize, pos: usize, end: usize) -> bool {
        let grammar = self.grammar;
        let rhs = &grammar.production(production).rhs;
        if idx == rhs.len() {
            return pos == end;
        }
        if pos >= end {
            return false;
        }
        if let Some(&known) = self.feasible.get(&(production, idx, pos, end)) {
            return known;
        }

        let remaining = rhs.len() - idx - 1;
        let result = match &rhs[idx] {
            Symbol::Terminal(t) => {
                self.tokens[pos] == *t && self.feasible(production, idx + 1, pos + 1, end)
            }
            Symbol::NonTerminal(nt) => {
                let nt = *nt;
                match end.checked_sub(remaining) {
                    Some(last) => (pos + 1..=last).any(|mid| {
                        self.chart.spans.contains(&(nt, pos, mid))
                            && self.feasible(production, idx + 1, mid, end)
                    }),
                    None => false,
                }
            }
        };

        self.feasible.insert((production, idx, pos, end), result);
        result
    }
}
