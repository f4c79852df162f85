//! Mock Python execution: approximates what a tiny Python subset prints, without a real interpreter.
//!
//! `run` evaluates three passes in a fixed order over the same source:
//!
//! 1. every `print(<arg>)` call renders one line (see [`argument::Argument`]);
//! 2. if a `for <v> in range(..): print(<v>)` loop is recognised, its lines
//!    REPLACE everything pass 1 produced (kept for compatibility with authored
//!    exercise output, not a feature to extend);
//! 3. every `print(type(<name>))` appends the class line for the literal
//!    assigned to `<name>`.
//!
//! Lines are joined with `\n`, without a trailing newline.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument};

pub mod argument;
pub mod arith;
pub mod assignments;
pub mod scan;

use argument::Argument;
use arith::is_numeric_literal;
use assignments::{is_quoted, Assignments};

/// Internal faults raised while interpreting a source text.
///
/// Display strings follow the wording a learner would see from Python.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("SyntaxError: '(' was never closed (line {line})")]
    Syntax { line: usize },
    #[error("ZeroDivisionError: division by zero")]
    ZeroDivision,
    #[error("OverflowError: numerical result out of range")]
    Overflow,
    #[error("OutputLimit: loop would print more than {limit} lines")]
    OutputLimit { limit: u64 },
}

/// Async front for [`run`], simulating an out-of-process interpreter call.
#[derive(Clone, Debug)]
pub struct MockInterpreter {
    latency: Duration,
}

impl MockInterpreter {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// Wait the configured latency, then run the passes. Not cancellable once started.
    #[instrument(level = "debug", target = "engine", skip(self, source), fields(source_len = source.len()))]
    pub async fn execute(&self, source: &str) -> Result<String, EngineError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        run(source)
    }
}

impl Default for MockInterpreter {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

/// Run all passes over `source` and return the printed text.
pub fn run(source: &str) -> Result<String, EngineError> {
    let table = Assignments::scan(source);
    let calls = scan::print_calls(source)?;

    let mut lines = calls
        .iter()
        .map(|call| Argument::classify(call.argument).render(&table))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(range) = scan::printed_range(source)? {
        lines = range.map(|i| i.to_string()).collect();
    }

    for call in &calls {
        if let Argument::Call { callee: "type", inner, .. } = Argument::classify(call.argument) {
            if let Some(class) = type_line(inner.trim(), &table) {
                lines.push(class.to_string());
            }
        }
    }

    debug!(target: "engine", assignments = table.len(), print_calls = calls.len(), lines = lines.len(), "mock execution finished");
    Ok(lines.join("\n"))
}

fn type_line(name: &str, table: &Assignments) -> Option<&'static str> {
    if name.is_empty() || !name.chars().all(|c| c == '_' || c.is_alphanumeric()) {
        return None;
    }
    let value = table.raw(name)?;
    if is_numeric_literal(value) {
        if value.contains('.') {
            Some("<class 'float'>")
        } else {
            Some("<class 'int'>")
        }
    } else if is_quoted(value) {
        Some("<class 'str'>")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_print() {
        assert_eq!(run("print(\"Hello, Python!\")").unwrap(), "Hello, Python!");
    }

    #[test]
    fn fstring_with_assigned_variable() {
        assert_eq!(run("v = \"Y\"\nprint(f\"{v}\")").unwrap(), "Y");
    }

    #[test]
    fn unknown_fstring_expression_is_left_alone() {
        assert_eq!(run("print(f\"{a+b}\")").unwrap(), "{a+b}");
    }

    #[test]
    fn japanese_greeting_exercise() {
        let src = "greeting = \"こんにちは\"\nprint(greeting)";
        assert_eq!(run(src).unwrap(), "こんにちは");
    }

    #[test]
    fn lines_join_without_trailing_newline() {
        assert_eq!(run("print(1)\nprint(2)\nprint(3)").unwrap(), "1\n2\n3");
        assert_eq!(run("x = 1").unwrap(), "");
    }

    #[test]
    fn loop_output() {
        assert_eq!(run("for i in range(0, 5): print(i)").unwrap(), "0\n1\n2\n3\n4");
        assert_eq!(run("for i in range(5):\n    print(i)").unwrap(), "0\n1\n2\n3\n4");
        assert_eq!(run("for n in range(1, 6):\n    print(n)").unwrap(), "1\n2\n3\n4\n5");
    }

    #[test]
    fn loop_discards_earlier_print_output() {
        let src = "print(\"start\")\nfor i in range(0, 5): print(i)\nprint(\"end\")";
        assert_eq!(run(src).unwrap(), "0\n1\n2\n3\n4");
    }

    #[test]
    fn type_introspection_appends_class_lines() {
        let int = run("x = 5\nprint(type(x))").unwrap();
        assert!(int.lines().any(|l| l == "<class 'int'>"));
        let float = run("x = 5.0\nprint(type(x))").unwrap();
        assert!(float.lines().any(|l| l == "<class 'float'>"));
        let string = run("x = \"hi\"\nprint(type(x))").unwrap();
        assert!(string.lines().any(|l| l == "<class 'str'>"));
    }

    #[test]
    fn type_pass_runs_after_loop_pass() {
        let src = "x = 1\nprint(type(x))\nfor i in range(2): print(i)";
        assert_eq!(run(src).unwrap(), "0\n1\n<class 'int'>");
    }

    #[test]
    fn type_of_unclassifiable_value_prints_nothing_extra() {
        assert_eq!(run("xs = [1, 2]\nprint(type(xs))").unwrap(), "type(xs)");
        assert_eq!(run("print(type(nope))").unwrap(), "type(nope)");
    }

    #[test]
    fn deeply_nested_arithmetic_falls_back_instead_of_recursing() {
        let placeholder = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        let src = format!("print(f\"{{{placeholder}}}\")");
        assert_eq!(run(&src).unwrap(), format!("{{{placeholder}}}"));

        let signs = format!("{}1", "-".repeat(200_000));
        let src = format!("x = {signs}\nprint(x)");
        assert_eq!(run(&src).unwrap(), signs);
    }

    #[test]
    fn commented_out_print_is_not_executed() {
        assert_eq!(run("# print( で出力します\nprint(\"ok\")").unwrap(), "ok");
        assert_eq!(run("print(\"a\")  # print(\"b\"\n").unwrap(), "a");
    }

    #[test]
    fn floor_division_and_tiny_values_render_like_python() {
        assert_eq!(run("print(f\"{7//2}\")").unwrap(), "3");
        assert_eq!(run("x = 1 / 10000000\nprint(x)").unwrap(), "1e-07");
    }

    #[test]
    fn faults_propagate() {
        assert_eq!(run("print(\"open\""), Err(EngineError::Syntax { line: 1 }));
        assert_eq!(run("print(f\"{1/0}\")"), Err(EngineError::ZeroDivision));
        assert_eq!(run("big = 10 ** 400\nprint(big)"), Err(EngineError::Overflow));
        assert_eq!(
            EngineError::ZeroDivision.to_string(),
            "ZeroDivisionError: division by zero"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn execute_waits_the_configured_latency() {
        let interp = MockInterpreter::default();
        let started = tokio::time::Instant::now();
        let out = interp.execute("print('x')").await.unwrap();
        assert_eq!(out, "x");
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn zero_latency_runs_immediately() {
        let interp = MockInterpreter::new(Duration::ZERO);
        assert_eq!(interp.execute("print(42)").await.unwrap(), "42");
    }
}
