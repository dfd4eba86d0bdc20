//! Query layout for renamed output
//!
//! Tokenizes with sqlparser's Hive dialect and re-emits every token from its
//! original slice of the input, so literals and identifiers keep their exact
//! bytes. Unquoted keywords are upper-cased and top-level clauses start on a new
//! line, indented by the parenthesis depth of the SELECT they belong to.

use sqlparser::dialect::HiveDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Location, Token, TokenWithSpan, Tokenizer, Whitespace};

use crate::parser::find_between;

const INDENT: &str = "  ";

/// Words that start a clause on a new line.
const CLAUSE_KEYWORDS: &[&str] = &[
    "FROM", "WHERE", "GROUP", "HAVING", "ORDER", "SORT", "CLUSTER", "DISTRIBUTE", "LIMIT",
    "UNION", "JOIN", "LEFT", "RIGHT", "FULL", "INNER", "CROSS",
];

/// Words after which a `JOIN` stays on the same line.
const JOIN_MODIFIERS: &[&str] = &["LEFT", "RIGHT", "FULL", "INNER", "CROSS", "OUTER", "SEMI"];

/// Lay out `sql`. Text the tokenizer rejects is returned unchanged.
pub fn format_query(sql: &str) -> String {
    let dialect = HiveDialect {};
    let tokens = match Tokenizer::new(&dialect, sql).tokenize_with_location() {
        Ok(tokens) => tokens,
        Err(_) => return sql.to_string(),
    };

    let offsets = LineOffsets::new(sql);
    let starts: Vec<usize> = tokens.iter().map(|t| offsets.byte_offset(sql, t.span.start)).collect();
    // Template variables are copied verbatim
    let protected = find_between(sql, "${", "}");

    let mut out = String::with_capacity(sql.len() + 16);
    let mut pending_space: Option<&str> = None;
    // One entry per open parenthesis, plus the statement: true when it holds a SELECT
    let mut levels: Vec<bool> = vec![true];
    let mut previous: Option<&Token> = None;
    let mut previous_word: Option<String> = None;

    for (i, TokenWithSpan { token, .. }) in tokens.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(sql.len());
        let text = &sql[starts[i]..end];

        if protected.iter().any(|range| range.contains(&starts[i])) {
            flush_space(&mut out, &mut pending_space);
            out.push_str(text);
            previous = Some(token);
            continue;
        }

        match token {
            Token::Whitespace(Whitespace::SingleLineComment { .. }) => {
                flush_space(&mut out, &mut pending_space);
                out.push_str(text);
            }
            Token::Whitespace(_) => {
                pending_space = Some(text);
                continue;
            }
            Token::LParen => {
                flush_space(&mut out, &mut pending_space);
                out.push('(');
                levels.push(false);
            }
            Token::RParen => {
                flush_space(&mut out, &mut pending_space);
                out.push(')');
                if levels.len() > 1 {
                    levels.pop();
                }
            }
            Token::Word(word) => {
                let upper = word.value.to_uppercase();
                let after_paren = matches!(previous, Some(Token::LParen));
                if upper == "SELECT" && after_paren {
                    if let Some(level) = levels.last_mut() {
                        *level = true;
                    }
                }

                let at_query_level = levels.last().copied().unwrap_or(false);
                let breaks = at_query_level
                    && !out.is_empty()
                    && match upper.as_str() {
                        "SELECT" => !after_paren,
                        "JOIN" => !previous_word
                            .as_deref()
                            .is_some_and(|w| JOIN_MODIFIERS.contains(&w)),
                        other => CLAUSE_KEYWORDS.contains(&other),
                    };

                if breaks {
                    pending_space = None;
                    out.push('\n');
                    out.push_str(&INDENT.repeat(levels.len() - 1));
                } else {
                    flush_space(&mut out, &mut pending_space);
                }

                if word.quote_style.is_none() && word.keyword != Keyword::NoKeyword {
                    out.push_str(&text.to_uppercase());
                } else {
                    out.push_str(text);
                }
                previous_word = Some(upper);
            }
            _ => {
                flush_space(&mut out, &mut pending_space);
                out.push_str(text);
            }
        }
        previous = Some(token);
    }

    out.trim().to_string()
}

fn flush_space<'a>(out: &mut String, pending: &mut Option<&'a str>) {
    if pending.take().is_some() && !out.is_empty() && !out.ends_with('\n') {
        out.push(' ');
    }
}

/// Byte offset of the first character of every line.
struct LineOffsets(Vec<usize>);

impl LineOffsets {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self(starts)
    }

    /// Convert a 1-based line/column (columns count characters) to a byte offset.
    fn byte_offset(&self, text: &str, location: Location) -> usize {
        let line = (location.line as usize).saturating_sub(1);
        let Some(&line_start) = self.0.get(line) else {
            return text.len();
        };
        let column = (location.column as usize).saturating_sub(1);
        text[line_start..]
            .char_indices()
            .nth(column)
            .map_or(text.len(), |(i, _)| line_start + i)
    }
}
