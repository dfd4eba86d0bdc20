//! Query normalization and literal extraction
//!
//! Turns raw query text into the upper-cased token stream consumed by the chart
//! parser. Comments are removed and kept aside; template variables (`${...}`),
//! quoted strings and numerals are replaced by [`PLACEHOLDER`] and kept aside in
//! order of appearance, so reconstruction can replay them one for one.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Token substituted for every extracted literal.
pub const PLACEHOLDER: &str = "#WORD#";

/// Punctuation and operators isolated with surrounding spaces.
static OPERATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<=|>=|<>|!=|==|[,;()=<>+\-*/%.]").unwrap());

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").unwrap());

/// Characters that may sit directly next to a bare numeral.
const NUMBER_BOUNDARY: &[char] = &[',', ';', '(', ')', '=', '<', '>', '+', '-', '*', '/', '%'];

/// Result of normalizing one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenizedQuery {
    /// Upper-cased tokens, punctuation isolated, literals replaced by [`PLACEHOLDER`]
    pub tokens: Vec<String>,
    /// Comments removed from the query, trimmed, in order of appearance
    pub comments: Vec<String>,
    /// Literals removed from the query, verbatim, in order of appearance
    pub words: Vec<String>,
}

/// Normalize a (possibly multi-line) query.
pub fn tokenize(query: &str) -> TokenizedQuery {
    let mut comments = Vec::new();
    let line = query
        .lines()
        .map(|line| {
            let (code, comment) = remove_comment(line);
            comments.extend(comment);
            code
        })
        .collect::<Vec<_>>()
        .join(" ");

    let (normalized, words) = extract_literals(&line);
    let tokens = normalized.split_whitespace().map(str::to_string).collect();

    TokenizedQuery {
        tokens,
        comments,
        words,
    }
}

/// Split a line at the first `--` outside a quoted literal.
///
/// Returns the code before the comment and the trimmed comment, if any.
pub fn remove_comment(line: &str) -> (&str, Option<String>) {
    let mut quote: Option<char> = None;
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match quote {
            Some(_) if c == '\\' => {
                chars.next();
            }
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '-' && matches!(chars.peek(), Some((_, '-'))) => {
                return (&line[..i], Some(line[i..].trim().to_string()));
            }
            None => {}
        }
    }

    (line, None)
}

/// Find every non-overlapping `start ... end` occurrence, left to right.
///
/// Ranges cover the delimiters. An unterminated `start` ends the search.
pub fn find_between(text: &str, start: &str, end: &str) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    find_between_from(text, start, end, 0, &mut found);
    found
}

fn find_between_from(
    text: &str,
    start: &str,
    end: &str,
    offset: usize,
    found: &mut Vec<Range<usize>>,
) {
    let Some(open) = text[offset..].find(start).map(|i| offset + i) else {
        return;
    };
    let content = open + start.len();
    let Some(close) = text[content..].find(end).map(|i| content + i + end.len()) else {
        return;
    };

    found.push(open..close);
    find_between_from(text, start, end, close, found);
}

/// Find every `quote`-delimited literal, left to right.
///
/// A backslash escapes the character after it, so `'it\'s'` is one literal.
/// An unterminated literal is not reported.
pub fn find_quoted(text: &str, quote: char) -> Vec<Range<usize>> {
    let mut found = Vec::new();
    let mut open: Option<usize> = None;
    let mut chars = text.char_indices();

    while let Some((i, c)) = chars.next() {
        match open {
            Some(_) if c == '\\' => {
                chars.next();
            }
            Some(start) if c == quote => {
                found.push(start..i + c.len_utf8());
                open = None;
            }
            Some(_) => {}
            None if c == quote => open = Some(i),
            None => {}
        }
    }

    found
}

/// Find numerals delimited by whitespace, line boundaries or punctuation.
///
/// Digits inside identifiers such as `T1` or `estas1` are not matched.
pub fn find_numbers(text: &str) -> Vec<Range<usize>> {
    let is_boundary = |c: char| c.is_whitespace() || NUMBER_BOUNDARY.contains(&c);

    NUMBER_RE
        .find_iter(text)
        .filter(|m| {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            before.map_or(true, is_boundary) && after.map_or(true, is_boundary)
        })
        .map(|m| m.range())
        .collect()
}

/// Replace template variables, quoted strings and numerals with [`PLACEHOLDER`].
///
/// Candidates from every scanner are merged by start offset; on overlap the one
/// starting first wins (a numeral inside a string stays part of the string).
/// Text between literals is upper-cased with punctuation isolated.
fn extract_literals(line: &str) -> (String, Vec<String>) {
    let mut spans: Vec<(Range<usize>, u8)> = Vec::new();
    spans.extend(find_between(line, "${", "}").into_iter().map(|r| (r, 0)));
    spans.extend(find_quoted(line, '\'').into_iter().map(|r| (r, 1)));
    spans.extend(find_quoted(line, '"').into_iter().map(|r| (r, 2)));
    spans.extend(find_numbers(line).into_iter().map(|r| (r, 3)));
    spans.sort_by_key(|(range, rank)| (range.start, *rank));

    let mut normalized = String::with_capacity(line.len() + 16);
    let mut words = Vec::new();
    let mut last = 0;

    for (range, _) in spans {
        if range.start < last {
            continue;
        }
        normalized.push_str(&normalize_segment(&line[last..range.start]));
        normalized.push(' ');
        normalized.push_str(PLACEHOLDER);
        normalized.push(' ');
        words.push(line[range.clone()].to_string());
        last = range.end;
    }
    normalized.push_str(&normalize_segment(&line[last..]));

    (normalized, words)
}

fn normalize_segment(segment: &str) -> String {
    OPERATOR_RE.replace_all(segment, " $0 ").to_uppercase()
}

/// Split a script into statements on `;` outside literals and comments.
///
/// Comments stay with the statement text they appear in; blank statements are dropped.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_comment = false;
    let mut chars = script.chars().peekable();

    while let Some(c) = chars.next() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            current.push(c);
            continue;
        }

        match quote {
            Some(q) => {
                current.push(c);
                if c == '\\' {
                    current.extend(chars.next());
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '-' if chars.peek() == Some(&'-') => {
                    in_comment = true;
                    current.push(c);
                }
                ';' => {
                    if !current.trim().is_empty() {
                        statements.push(std::mem::take(&mut current));
                    }
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }

    if !current.trim().is_empty() {
        statements.push(current);
    }

    statements
}
