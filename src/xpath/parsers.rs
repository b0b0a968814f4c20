//! Condition parser
//!
//! Parses the subset of XPath that schema `when` and `must` statements use
//! in practice:
//!
//! ```text
//! expr    := or
//! or      := and ("or" and)*
//! and     := unary ("and" unary)*
//! unary   := "not(" expr ")" | "true()" | "false()" | "(" expr ")" | compare
//! compare := path (("=" | "!=") literal)?
//! literal := 'text' | "text" | number
//! ```
//!
//! Anything else (other functions, arithmetic, path-to-path comparisons) is
//! rejected with an [`XPathParseError`]; callers fall back to the `xpath_map`
//! override for those expressions.

use std::fmt;

use super::selectors::{is_identifier_char, SchemaPath};

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "!="),
        }
    }
}

/// Parsed condition expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Disjunction
    Or(Box<Expr>, Box<Expr>),
    /// Conjunction
    And(Box<Expr>, Box<Expr>),
    /// `not(...)`
    Not(Box<Expr>),
    /// `true()` / `false()`
    Const(bool),
    /// Bare path: true when the target is present
    Exists(SchemaPath),
    /// `path = literal` / `path != literal`
    Compare {
        /// Left-hand path
        path: SchemaPath,
        /// Operator
        op: CompareOp,
        /// Literal text, unquoted
        value: String,
    },
}

impl Expr {
    /// All paths referenced by the expression, in source order
    pub fn paths(&self) -> Vec<&SchemaPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a SchemaPath>) {
        match self {
            Expr::Or(a, b) | Expr::And(a, b) => {
                a.collect_paths(out);
                b.collect_paths(out);
            }
            Expr::Not(inner) => inner.collect_paths(out),
            Expr::Const(_) => {}
            Expr::Exists(path) | Expr::Compare { path, .. } => out.push(path),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Or(a, b) => write!(f, "({} or {})", a, b),
            Expr::And(a, b) => write!(f, "({} and {})", a, b),
            Expr::Not(inner) => write!(f, "not({})", inner),
            Expr::Const(true) => write!(f, "true()"),
            Expr::Const(false) => write!(f, "false()"),
            Expr::Exists(path) => write!(f, "{}", path),
            Expr::Compare { path, op, value } => write!(f, "{} {} '{}'", path, op, value),
        }
    }
}

/// Condition parse error
#[derive(Debug, Clone, PartialEq)]
pub enum XPathParseError {
    /// A function the evaluator does not implement
    UnsupportedFunction(String),
    /// Invalid syntax
    InvalidSyntax(String),
    /// Unexpected end of expression
    UnexpectedEnd,
}

impl fmt::Display for XPathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFunction(name) => write!(f, "Unsupported function: {}()", name),
            Self::InvalidSyntax(msg) => write!(f, "Invalid condition syntax: {}", msg),
            Self::UnexpectedEnd => write!(f, "Unexpected end of condition"),
        }
    }
}

impl std::error::Error for XPathParseError {}

// =============================================================================
// Lexer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Eq,
    Ne,
    And,
    Or,
    /// Function name; the opening parenthesis is consumed with it
    Function(String),
    Literal(String),
    Path(String),
}

fn tokenize(input: &str) -> Result<Vec<Token>, XPathParseError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '=' => {
                tokens.push(Token::Eq);
                i += 1;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&q| q == c)
                    .ok_or(XPathParseError::UnexpectedEnd)?;
                tokens.push(Token::Literal(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            c if c.is_ascii_digit()
                || (c == '-' && chars.get(i + 1).map_or(false, |d| d.is_ascii_digit())) =>
            {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                tokens.push(Token::Literal(chars[start..i].iter().collect()));
            }
            c if is_path_start(c) => {
                let start = i;
                i = scan_path(&chars, i)?;
                let word: String = chars[start..i].iter().collect();
                let next = chars[i..].iter().find(|c| !c.is_whitespace());
                match word.as_str() {
                    "and" => tokens.push(Token::And),
                    "or" => tokens.push(Token::Or),
                    _ if next == Some(&'(') && !word.contains('/') => {
                        // consume up to and including the parenthesis
                        while chars[i] != '(' {
                            i += 1;
                        }
                        i += 1;
                        tokens.push(Token::Function(word));
                    }
                    _ => tokens.push(Token::Path(word)),
                }
            }
            other => {
                return Err(XPathParseError::InvalidSyntax(format!(
                    "unexpected character '{}'",
                    other
                )))
            }
        }
    }
    Ok(tokens)
}

fn is_path_start(c: char) -> bool {
    c == '/' || c == '.' || c == '_' || c.is_alphabetic()
}

/// Scan a location path starting at `start`, returning the end index.
/// Predicates are consumed with balanced brackets and quotes.
fn scan_path(chars: &[char], start: usize) -> Result<usize, XPathParseError> {
    const CURRENT: &str = "current()";
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        if c == 'c' && chars[i..].iter().take(CURRENT.len()).copied().eq(CURRENT.chars()) {
            i += CURRENT.len();
        } else if c == '[' {
            let mut depth = 0usize;
            let mut quote: Option<char> = None;
            loop {
                let ch = *chars.get(i).ok_or(XPathParseError::UnexpectedEnd)?;
                match (quote, ch) {
                    (Some(q), ch) if ch == q => quote = None,
                    (Some(_), _) => {}
                    (None, '\'' | '"') => quote = Some(ch),
                    (None, '[') => depth += 1,
                    (None, ']') => {
                        depth -= 1;
                        if depth == 0 {
                            i += 1;
                            break;
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
        } else if is_identifier_char(c) || c == '/' || c == ':' {
            i += 1;
        } else {
            break;
        }
    }
    Ok(i)
}

// =============================================================================
// Parser
// =============================================================================

/// Recursive-descent parser for conditions
#[derive(Debug, Clone, Default)]
pub struct ConditionParser;

impl ConditionParser {
    /// Create a parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a condition expression
    pub fn parse(&self, expression: &str) -> Result<Expr, XPathParseError> {
        let tokens = tokenize(expression)?;
        if tokens.is_empty() {
            return Err(XPathParseError::UnexpectedEnd);
        }
        let mut state = ParserState { tokens, pos: 0 };
        let expr = state.parse_or()?;
        if let Some(extra) = state.peek() {
            return Err(XPathParseError::InvalidSyntax(format!(
                "unexpected trailing token {:?}",
                extra
            )));
        }
        Ok(expr)
    }
}

/// Parse a condition with the default parser
pub fn parse_condition(expression: &str) -> Result<Expr, XPathParseError> {
    ConditionParser::new().parse(expression)
}

struct ParserState {
    tokens: Vec<Token>,
    pos: usize,
}

impl ParserState {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), XPathParseError> {
        match self.next() {
            Some(ref t) if *t == expected => Ok(()),
            Some(t) => Err(XPathParseError::InvalidSyntax(format!(
                "expected {:?}, found {:?}",
                expected, t
            ))),
            None => Err(XPathParseError::UnexpectedEnd),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, XPathParseError> {
        let mut left = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, XPathParseError> {
        let mut left = self.parse_unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, XPathParseError> {
        match self.next().ok_or(XPathParseError::UnexpectedEnd)? {
            Token::Function(name) => match name.as_str() {
                "not" => {
                    let inner = self.parse_or()?;
                    self.expect(Token::RParen)?;
                    Ok(Expr::Not(Box::new(inner)))
                }
                "true" | "false" => {
                    self.expect(Token::RParen)?;
                    Ok(Expr::Const(name == "true"))
                }
                _ => Err(XPathParseError::UnsupportedFunction(name)),
            },
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Path(text) => {
                let path = SchemaPath::parse(text.as_str());
                if !path.is_well_formed() {
                    return Err(XPathParseError::InvalidSyntax(format!("bad path '{}'", text)));
                }
                let op = match self.peek() {
                    Some(Token::Eq) => CompareOp::Eq,
                    Some(Token::Ne) => CompareOp::Ne,
                    _ => return Ok(Expr::Exists(path)),
                };
                self.pos += 1;
                match self.next() {
                    Some(Token::Literal(value)) => Ok(Expr::Compare { path, op, value }),
                    Some(other) => Err(XPathParseError::InvalidSyntax(format!(
                        "expected literal after '{}', found {:?}",
                        op, other
                    ))),
                    None => Err(XPathParseError::UnexpectedEnd),
                }
            }
            other => Err(XPathParseError::InvalidSyntax(format!(
                "unexpected token {:?}",
                other
            ))),
        }
    }
}
