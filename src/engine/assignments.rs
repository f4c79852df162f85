//! Assignment table built once per execution.
//!
//! Only statement-shaped assignments count: `<name> = <value>` at the start of a
//! (possibly indented) line. Comparisons (`==`) and augmented assignments (`+=`)
//! are not assignments. Later assignments to the same name replace earlier ones.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::arith::is_numeric_literal;

static ASSIGNMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^\W\d]\w*)\s*=\s*([^=].*)$").expect("valid assignment regex")
});

#[derive(Debug, Default, Clone)]
pub struct Assignments {
    values: HashMap<String, String>,
}

impl Assignments {
    pub fn scan(source: &str) -> Self {
        let mut values = HashMap::new();
        for line in source.lines() {
            if let Some(caps) = ASSIGNMENT_RE.captures(line) {
                let value = caps[2].trim();
                if value.is_empty() {
                    continue;
                }
                values.insert(caps[1].to_string(), value.to_string());
            }
        }
        Self { values }
    }

    /// Raw right-hand side text of the last assignment to `name`.
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of `name` when its last assignment is a plain numeric literal.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        let raw = self.raw(name)?;
        if !is_numeric_literal(raw) {
            return None;
        }
        raw.parse::<f64>().ok()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Strip one pair of matching surrounding quotes (`"..."` or `'...'`).
pub fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

pub fn is_quoted(value: &str) -> bool {
    value.starts_with('"') || value.starts_with('\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_assignment_wins() {
        let t = Assignments::scan("x = 1\ny = \"hi\"\nx = 2\n");
        assert_eq!(t.raw("x"), Some("2"));
        assert_eq!(t.raw("y"), Some("\"hi\""));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn comparisons_and_augmented_are_not_assignments() {
        let t = Assignments::scan("if x == 5:\n    pass\ntotal += 3\nx==1");
        assert_eq!(t.raw("x"), None);
        assert_eq!(t.raw("total"), None);
    }

    #[test]
    fn indented_and_unicode_names_are_recognised() {
        let t = Assignments::scan("def f():\n    total = 10\n名前 = \"花子\"");
        assert_eq!(t.raw("total"), Some("10"));
        assert_eq!(t.raw("名前"), Some("\"花子\""));
    }

    #[test]
    fn numeric_lookup_requires_literal() {
        let t = Assignments::scan("a = 3.5\nb = a * 2\nc = \"7\"");
        assert_eq!(t.numeric("a"), Some(3.5));
        assert_eq!(t.numeric("b"), None);
        assert_eq!(t.numeric("c"), None);
    }

    #[test]
    fn unquote_strips_matching_pairs_only() {
        assert_eq!(unquote("\"hi\""), "hi");
        assert_eq!(unquote("'hi'"), "hi");
        assert_eq!(unquote("\"hi'"), "\"hi'");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("42"), "42");
    }
}
