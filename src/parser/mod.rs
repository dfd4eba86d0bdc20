//! Hive query parsing: tokenizer, grammar, chart parser and parse tree

pub mod labels;

mod chart_parser;
mod grammar;
mod tokenizer;
mod tree;

pub use chart_parser::ChartParser;
pub use grammar::{BaseGrammar, Grammar, Production, Symbol};
pub use tokenizer::{
    find_between, find_numbers, find_quoted, remove_comment, split_statements, tokenize, TokenizedQuery,
    PLACEHOLDER,
};
pub use tree::{Node, NodeId, ParseTree};
