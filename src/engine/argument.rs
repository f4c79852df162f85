//! Classification and rendering of a single `print(...)` argument.

use std::sync::LazyLock;

use regex::Regex;

use super::arith::{self, format_number, is_numeric_literal, ArithError};
use super::assignments::{unquote, Assignments};
use super::EngineError;

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\W\d]\w*$").expect("valid identifier regex"));
static CALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([^\W\d][\w.]*)\s*\((.*)\)$").expect("valid call regex")
});
static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("valid placeholder regex"));
static ARITH_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9+\-*/().]+$").expect("valid arithmetic regex"));

#[derive(Debug, Clone, PartialEq)]
pub enum Argument<'a> {
    /// `f"..."` / `f'...'`, holding the body between the quotes.
    FString(&'a str),
    /// Quoted literal, holding the text between the first and last character.
    Literal(&'a str),
    Number(&'a str),
    Identifier(&'a str),
    Call { callee: &'a str, inner: &'a str, raw: &'a str },
    /// Anything else; printed as written.
    Expr(&'a str),
}

impl<'a> Argument<'a> {
    pub fn classify(raw: &'a str) -> Self {
        let arg = raw.trim();
        if arg.starts_with("f\"") || arg.starts_with("f'") {
            return Argument::FString(strip_ends(&arg[1..]));
        }
        if arg.starts_with('"') || arg.starts_with('\'') {
            return Argument::Literal(strip_ends(arg));
        }
        if is_numeric_literal(arg) {
            return Argument::Number(arg);
        }
        if IDENT_RE.is_match(arg) {
            return Argument::Identifier(arg);
        }
        if let Some(caps) = CALL_RE.captures(arg) {
            let (Some(callee), Some(inner)) = (caps.get(1), caps.get(2)) else {
                return Argument::Expr(arg);
            };
            return Argument::Call { callee: callee.as_str(), inner: inner.as_str(), raw: arg };
        }
        Argument::Expr(arg)
    }

    /// Render to exactly one output line.
    pub fn render(&self, table: &Assignments) -> Result<String, EngineError> {
        match self {
            Argument::FString(body) => render_fstring(body, table),
            Argument::Literal(text) | Argument::Number(text) => Ok((*text).to_string()),
            Argument::Identifier(name) => render_identifier(name, table),
            Argument::Call { raw, .. } | Argument::Expr(raw) => Ok((*raw).to_string()),
        }
    }
}

/// Drop the first and last character (the surrounding quotes).
fn strip_ends(s: &str) -> &str {
    let mut it = s.char_indices();
    let start = match it.next() {
        Some((_, c)) => c.len_utf8(),
        None => return "",
    };
    match s.char_indices().last() {
        Some((end, _)) if end >= start => &s[start..end],
        _ => "",
    }
}

fn render_fstring(body: &str, table: &Assignments) -> Result<String, EngineError> {
    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for caps in PLACEHOLDER_RE.captures_iter(body) {
        let (Some(whole), Some(expr)) = (caps.get(0), caps.get(1)) else { continue };
        out.push_str(&body[last..whole.start()]);
        out.push_str(&substitute_placeholder(expr.as_str(), table)?);
        last = whole.end();
    }
    out.push_str(&body[last..]);
    Ok(out)
}

fn substitute_placeholder(expr: &str, table: &Assignments) -> Result<String, EngineError> {
    let key = expr.trim();
    if let Some(value) = table.raw(key) {
        return Ok(unquote(value).to_string());
    }
    if ARITH_ONLY_RE.is_match(key) {
        match arith::eval(key) {
            Ok(v) => return finite(v).map(format_number),
            Err(ArithError::DivisionByZero) => return Err(EngineError::ZeroDivision),
            Err(_) => {}
        }
    }
    Ok(format!("{{{}}}", expr))
}

fn render_identifier(name: &str, table: &Assignments) -> Result<String, EngineError> {
    let Some(value) = table.raw(name) else {
        return Ok(name.to_string());
    };
    if value.contains(['*', '+', '-', '/']) {
        match arith::eval_with(value, |n| table.numeric(n)) {
            Ok(v) => return finite(v).map(format_number),
            Err(ArithError::DivisionByZero) => return Err(EngineError::ZeroDivision),
            // Unresolved names or non-arithmetic text: fall back to the raw value.
            Err(_) => {}
        }
    }
    Ok(unquote(value).to_string())
}

fn finite(v: f64) -> Result<f64, EngineError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EngineError::Overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(arg: &str, source: &str) -> Result<String, EngineError> {
        Argument::classify(arg).render(&Assignments::scan(source))
    }

    #[test]
    fn classification_order() {
        assert_eq!(Argument::classify("f\"{x}\""), Argument::FString("{x}"));
        assert_eq!(Argument::classify("'hi'"), Argument::Literal("hi"));
        assert_eq!(Argument::classify(" 3.14 "), Argument::Number("3.14"));
        assert_eq!(Argument::classify("greeting"), Argument::Identifier("greeting"));
        assert_eq!(
            Argument::classify("type(x)"),
            Argument::Call { callee: "type", inner: "x", raw: "type(x)" }
        );
        assert_eq!(Argument::classify("a + b"), Argument::Expr("a + b"));
    }

    #[test]
    fn literal_keeps_inner_text_verbatim() {
        assert_eq!(render("\"こんにちは\"", "").unwrap(), "こんにちは");
        assert_eq!(render("\"a\" + \"b\"", "").unwrap(), "a\" + \"b");
        assert_eq!(render("\"\"", "").unwrap(), "");
    }

    #[test]
    fn fstring_substitutes_assigned_values() {
        let src = "product = \"りんご\"\nprice = 150";
        assert_eq!(render("f\"{product}は{price}円です\"", src).unwrap(), "りんごは150円です");
    }

    #[test]
    fn fstring_evaluates_pure_arithmetic() {
        assert_eq!(render("f\"{2*3+1}\"", "").unwrap(), "7");
        assert_eq!(render("f\"{10/4}\"", "").unwrap(), "2.5");
        // whitespace disqualifies the arithmetic shortcut
        assert_eq!(render("f\"{2 * 3}\"", "").unwrap(), "{2 * 3}");
    }

    #[test]
    fn fstring_leaves_unknown_placeholders() {
        assert_eq!(render("f\"{a+b}\"", "").unwrap(), "{a+b}");
        assert_eq!(render("f\"{x:.2f}\"", "x = 3").unwrap(), "{x:.2f}");
        assert_eq!(render("f\"{(1+}\"", "").unwrap(), "{(1+}");
    }

    #[test]
    fn fstring_division_by_zero_faults() {
        assert_eq!(render("f\"{1/0}\"", ""), Err(EngineError::ZeroDivision));
    }

    #[test]
    fn identifier_resolves_and_evaluates() {
        assert_eq!(render("x", "x = 42").unwrap(), "42");
        assert_eq!(render("name", "name = 'Taro'").unwrap(), "Taro");
        assert_eq!(render("total", "a = 2\nb = 3\ntotal = a * b + 1").unwrap(), "7");
        assert_eq!(render("tax", "price = 1000\ntax = price * 0.1").unwrap(), "100");
    }

    #[test]
    fn identifier_falls_back_to_raw_text() {
        assert_eq!(render("missing", "").unwrap(), "missing");
        assert_eq!(render("s", "s = \"a-b\"").unwrap(), "a-b");
        assert_eq!(
            render("total", "tax = price * 0.1\ntotal = price + tax").unwrap(),
            "price + tax"
        );
        assert_eq!(render("items", "items = [1, 2]").unwrap(), "[1, 2]");
    }

    #[test]
    fn identifier_division_by_zero_faults() {
        assert_eq!(render("r", "a = 0\nr = 1 / a"), Err(EngineError::ZeroDivision));
    }

    #[test]
    fn calls_and_expressions_print_as_written() {
        assert_eq!(render("type(x)", "x = 5").unwrap(), "type(x)");
        assert_eq!(render("len(items)", "").unwrap(), "len(items)");
        assert_eq!(render("type (x)", "x = 5").unwrap(), "type (x)");
        assert_eq!(render("a + b", "a = 1\nb = 2").unwrap(), "a + b");
    }

    #[test]
    fn strip_ends_is_char_safe() {
        assert_eq!(strip_ends("「あ」"), "あ");
        assert_eq!(strip_ends("\""), "");
        assert_eq!(strip_ends(""), "");
    }
}
