//! Constrained arithmetic evaluation for f-string placeholders and assigned expressions.
//!
//! Grammar (Python precedence, `**` binds tighter than unary signs and is right-associative):
//!
//! ```text
//! expr   := term (("+" | "-") term)*
//! term   := unary (("*" | "/" | "//" | "%") unary)*
//! unary  := ("+" | "-") unary | power
//! power  := atom ("**" unary)?
//! atom   := number | name | "(" expr ")"
//! ```
//!
//! Names are resolved through a caller-supplied lookup; there is no symbol table here.
//! Nesting (parentheses, unary signs, exponent chains) is capped at [`MAX_DEPTH`].

use thiserror::Error;

/// Deepest nesting the parser will descend into before giving up.
pub const MAX_DEPTH: usize = 200;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArithError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
    #[error("name '{0}' is not defined")]
    UnknownName(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("expression nested too deeply")]
    TooDeep,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Name(String),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Num(n) => n.to_string(),
            Token::Name(n) => n.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::StarStar => "**".into(),
            Token::Slash => "/".into(),
            Token::SlashSlash => "//".into(),
            Token::Percent => "%".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<Token>, ArithError> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| ArithError::UnexpectedToken(text.clone()))?;
                out.push(Token::Num(n));
            }
            c if c == '_' || c.is_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i] == '_' || chars[i].is_alphanumeric()) {
                    i += 1;
                }
                out.push(Token::Name(chars[start..i].iter().collect()));
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                out.push(Token::StarStar);
                i += 2;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                out.push(Token::SlashSlash);
                i += 2;
            }
            '+' | '-' | '*' | '/' | '%' | '(' | ')' => {
                out.push(match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '(' => Token::LParen,
                    _ => Token::RParen,
                });
                i += 1;
            }
            other => return Err(ArithError::UnexpectedChar(other)),
        }
    }
    Ok(out)
}

struct Parser<'t, F> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
    resolve: F,
}

impl<'t, F> Parser<'t, F>
where
    F: Fn(&str) -> Option<f64>,
{
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expr(&mut self) -> Result<f64, ArithError> {
        let mut acc = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.pos += 1;
                    acc += self.term()?;
                }
                Token::Minus => {
                    self.pos += 1;
                    acc -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn term(&mut self) -> Result<f64, ArithError> {
        let mut acc = self.unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.pos += 1;
                    acc *= self.unary()?;
                }
                Token::Slash => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(ArithError::DivisionByZero);
                    }
                    acc /= rhs;
                }
                Token::SlashSlash => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(ArithError::DivisionByZero);
                    }
                    acc = (acc / rhs).floor();
                }
                Token::Percent => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(ArithError::DivisionByZero);
                    }
                    // Python modulo takes the sign of the divisor.
                    acc = acc - rhs * (acc / rhs).floor();
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    /// Every recursive path (signs, `**`, parentheses) passes through here.
    fn unary(&mut self) -> Result<f64, ArithError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ArithError::TooDeep);
        }
        let v = match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.unary().map(|v| -v)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        };
        self.depth -= 1;
        v
    }

    fn power(&mut self) -> Result<f64, ArithError> {
        let base = self.atom()?;
        if let Some(Token::StarStar) = self.peek() {
            self.pos += 1;
            let exp = self.unary()?;
            return Ok(base.powf(exp));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64, ArithError> {
        match self.next() {
            Some(Token::Num(n)) => Ok(n),
            Some(Token::Name(name)) => {
                (self.resolve)(&name).ok_or(ArithError::UnknownName(name))
            }
            Some(Token::LParen) => {
                let v = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(v),
                    Some(t) => Err(ArithError::UnexpectedToken(t.describe())),
                    None => Err(ArithError::UnexpectedEnd),
                }
            }
            Some(t) => Err(ArithError::UnexpectedToken(t.describe())),
            None => Err(ArithError::UnexpectedEnd),
        }
    }
}

/// Evaluate `src`, resolving bare names through `resolve`.
pub fn eval_with<F>(src: &str, resolve: F) -> Result<f64, ArithError>
where
    F: Fn(&str) -> Option<f64>,
{
    let tokens = tokenize(src)?;
    let mut p = Parser { tokens: &tokens, pos: 0, depth: 0, resolve };
    let v = p.expr()?;
    match p.next() {
        None => Ok(v),
        Some(t) => Err(ArithError::UnexpectedToken(t.describe())),
    }
}

/// Evaluate an expression that must not reference any names.
pub fn eval(src: &str) -> Result<f64, ArithError> {
    eval_with(src, |_| None)
}

/// Canonical rendering in the style of Python's float repr: integral values drop the
/// fraction, `-0` becomes `0`, and magnitudes below `1e-4` or from `1e16` up switch to
/// scientific notation with a signed two-digit exponent (`1e-07`, `2.5e+16`).
pub fn format_number(v: f64) -> String {
    if v == 0.0 {
        return "0".into();
    }
    let magnitude = v.abs();
    if magnitude < 1e-4 || magnitude >= 1e16 {
        let sci = format!("{:e}", v);
        if let Some((mantissa, exp)) = sci.split_once('e') {
            if let Ok(exp) = exp.parse::<i32>() {
                let sign = if exp < 0 { '-' } else { '+' };
                return format!("{mantissa}e{sign}{:02}", exp.abs());
            }
        }
        return sci;
    }
    format!("{}", v)
}

/// True when `text` reads as a complete numeric literal (`12`, `-3.5`, `.5`, `1e3`).
pub fn is_numeric_literal(text: &str) -> bool {
    let t = text.trim();
    let Some(first) = t.chars().next() else { return false };
    if !(first.is_ascii_digit() || matches!(first, '.' | '+' | '-')) {
        return false;
    }
    t.chars().any(|c| c.is_ascii_digit()) && t.parse::<f64>().map(f64::is_finite).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_follows_python() {
        assert_eq!(eval("1+2*3").unwrap(), 7.0);
        assert_eq!(eval("(1+2)*3").unwrap(), 9.0);
        assert_eq!(eval("2**3**2").unwrap(), 512.0);
        assert_eq!(eval("-2**2").unwrap(), -4.0);
        assert_eq!(eval("7 % -3").unwrap(), -2.0);
    }

    #[test]
    fn floor_division() {
        assert_eq!(eval("7//2").unwrap(), 3.0);
        assert_eq!(eval("-7 // 2").unwrap(), -4.0);
        assert_eq!(eval("7.5 // 2").unwrap(), 3.0);
        assert_eq!(eval("1 + 9 // 4 * 2").unwrap(), 5.0);
        assert_eq!(eval("1//0"), Err(ArithError::DivisionByZero));
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(eval(&deep), Err(ArithError::TooDeep));
        let signs = format!("{}1", "-".repeat(100_000));
        assert_eq!(eval(&signs), Err(ArithError::TooDeep));
        let tower = vec!["2"; 100_000].join("**");
        assert_eq!(eval(&tower), Err(ArithError::TooDeep));

        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(eval(&shallow).unwrap(), 1.0);
        assert_eq!(eval("--1").unwrap(), 1.0);
    }

    #[test]
    fn names_resolve_through_lookup() {
        let v = eval_with("price * 0.5 + tax", |n| match n {
            "price" => Some(100.0),
            "tax" => Some(8.0),
            _ => None,
        });
        assert_eq!(v.unwrap(), 58.0);
        assert_eq!(
            eval_with("a + b", |_| None),
            Err(ArithError::UnknownName("a".into()))
        );
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert_eq!(eval("1+"), Err(ArithError::UnexpectedEnd));
        assert_eq!(eval("(1"), Err(ArithError::UnexpectedEnd));
        assert!(matches!(eval("1 2"), Err(ArithError::UnexpectedToken(_))));
        assert_eq!(eval("1 & 2"), Err(ArithError::UnexpectedChar('&')));
        assert!(eval("1..2").is_err());
        assert_eq!(eval("1/0"), Err(ArithError::DivisionByZero));
    }

    #[test]
    fn numbers_render_canonically() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(10.0 / 3.0), "3.3333333333333335");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn extreme_magnitudes_use_scientific_notation() {
        assert_eq!(format_number(1e-7), "1e-07");
        assert_eq!(format_number(-1.5e-5), "-1.5e-05");
        assert_eq!(format_number(0.0001), "0.0001");
        assert_eq!(format_number(1e16), "1e+16");
        assert_eq!(format_number(2.5e20), "2.5e+20");
        assert_eq!(format_number(1e15), "1000000000000000");
        assert_eq!(format_number(1e300 * 10.0), "1e+301");
    }

    #[test]
    fn numeric_literal_detection() {
        assert!(is_numeric_literal("42"));
        assert!(is_numeric_literal("-3.5"));
        assert!(is_numeric_literal(".5"));
        assert!(is_numeric_literal("1e3"));
        assert!(!is_numeric_literal("inf"));
        assert!(!is_numeric_literal("x1"));
        assert!(!is_numeric_literal("1 2"));
        assert!(!is_numeric_literal(""));
    }
}
