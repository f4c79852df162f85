//! Source scanners: `print(...)` call extraction and the one supported loop shape.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::EngineError;

/// Upper bound on lines the loop recognizer may emit for a single run.
pub const MAX_LOOP_LINES: u64 = 10_000;

static LOOP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"for\s+(\w+)\s+in\s+range\s*\(\s*(\d+)\s*(?:,\s*(\d+))?\s*\)\s*:\s*\n?\s*print\s*\(\s*(\w+)\s*\)",
    )
    .expect("valid loop regex")
});

/// One `print(<argument>)` occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintCall<'a> {
    pub argument: &'a str,
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Every non-overlapping `print(...)` call in source order.
///
/// Comments and string literals outside a call are skipped, so a `print(` inside them
/// is not a call. The argument ends at the parenthesis balancing the opening one;
/// parentheses inside string literals or comments do not count. A call left open is
/// a syntax error.
pub fn print_calls(source: &str) -> Result<Vec<PrintCall<'_>>, EngineError> {
    let mut calls = Vec::new();
    let mut i = 0;
    while let Some(c) = source[i..].chars().next() {
        match c {
            '#' => i = line_end(source, i),
            '"' | '\'' => i = string_end(source, i),
            c if is_ident_char(c) => {
                let word_start = i;
                i = source[i..]
                    .find(|c: char| !is_ident_char(c))
                    .map_or(source.len(), |n| i + n);
                if &source[word_start..i] != "print" {
                    continue;
                }
                let rest = &source[i..];
                let open = rest.len() - rest.trim_start().len();
                if !rest[open..].starts_with('(') {
                    continue;
                }
                let arg_start = i + open + 1;
                let Some(arg_end) = closing_paren(source, arg_start) else {
                    let line = source[..word_start].matches('\n').count() + 1;
                    return Err(EngineError::Syntax { line });
                };
                calls.push(PrintCall { argument: &source[arg_start..arg_end] });
                i = arg_end + 1;
            }
            c => i += c.len_utf8(),
        }
    }
    Ok(calls)
}

/// Byte offset of the `)` closing a call whose argument starts at `start`.
fn closing_paren(source: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while let Some(c) = source[i..].chars().next() {
        match c {
            '"' | '\'' => {
                i = string_end(source, i);
                continue;
            }
            '#' => {
                i = line_end(source, i);
                continue;
            }
            '(' | '[' | '{' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += c.len_utf8();
    }
    None
}

/// Offset of the newline ending the line that holds `from`, or the end of source.
fn line_end(source: &str, from: usize) -> usize {
    source[from..].find('\n').map_or(source.len(), |n| from + n)
}

/// Offset just past the string literal opening at `start`.
///
/// Triple-quoted strings may span lines; a single-quoted string left open stops at
/// the end of its line.
fn string_end(source: &str, start: usize) -> usize {
    let rest = &source[start..];
    let Some(quote) = rest.chars().next() else {
        return source.len();
    };
    let triple: String = [quote; 3].iter().collect();
    let long = rest.starts_with(&triple);
    let open = if long { 3 } else { 1 };
    let mut escaped = false;
    for (i, c) in rest[open..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        let at = open + i;
        match c {
            '\\' => escaped = true,
            '\n' if !long => return start + at,
            c if c == quote && !long => return start + at + 1,
            c if c == quote && rest[at..].starts_with(&triple) => return start + at + 3,
            _ => {}
        }
    }
    source.len()
}

/// Range produced by the last `for <v> in range(..): print(<v>)` loop, if any.
///
/// Loops whose body prints something other than the loop variable are ignored.
pub fn printed_range(source: &str) -> Result<Option<Range<u64>>, EngineError> {
    let mut found = None;
    for caps in LOOP_RE.captures_iter(source) {
        if caps[1] != caps[4] {
            continue;
        }
        let first = parse_bound(&caps[2])?;
        let range = match caps.get(3) {
            Some(stop) => first..parse_bound(stop.as_str())?,
            None => 0..first,
        };
        if range.end.saturating_sub(range.start) > MAX_LOOP_LINES {
            return Err(EngineError::OutputLimit { limit: MAX_LOOP_LINES });
        }
        found = Some(range);
    }
    Ok(found)
}

fn parse_bound(digits: &str) -> Result<u64, EngineError> {
    digits
        .parse::<u64>()
        .map_err(|_| EngineError::OutputLimit { limit: MAX_LOOP_LINES })
}
