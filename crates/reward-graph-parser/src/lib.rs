//! # reward-graph-parser
//!
//! Parser for the requirement constraint DSL. A requirement list is either
//! a single constraint or a bracketed, comma-separated list:
//!
//! ```text
//! [ensure "x">0, achieve "x"<=0.5, encourage "y">5.0]
//! ```
//!
//! Each constraint is a requirement kind, a quoted variable name, a
//! comparison operator and a numeric bound. This crate only translates
//! text into typed tuples; wiring constraints into reward graphs is the
//! caller's concern.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Requirement class of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Safety requirement: must hold at all times
    Ensure,
    /// Target requirement: must eventually hold
    Achieve,
    /// Comfort requirement: rewarded but not required
    Encourage,
}

/// Comparison operator of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl Comparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::Gt => ">",
            Comparison::Lt => "<",
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        }
    }
}

/// One parsed constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub variable: String,
    pub comparison: Comparison,
    pub value: f64,
}

/// Parse failure with the byte offset it occurred at.
#[derive(Debug, Error)]
#[error("parse error at byte {position}: {message}")]
pub struct ParseError {
    pub position: usize,
    pub message: String,
}

impl ParseError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Keyword(ConstraintKind),
    Variable(String),
    Op(Comparison),
    Number(f64),
    LBracket,
    RBracket,
    Comma,
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn next_token(&mut self) -> Result<Option<(usize, Token)>, ParseError> {
        self.skip_whitespace();
        let start = self.pos;
        let rest = self.rest();
        let Some(first) = rest.chars().next() else {
            return Ok(None);
        };

        let token = match first {
            '[' => {
                self.pos += 1;
                Token::LBracket
            }
            ']' => {
                self.pos += 1;
                Token::RBracket
            }
            ',' => {
                self.pos += 1;
                Token::Comma
            }
            '"' => {
                let closing = rest[1..]
                    .find('"')
                    .ok_or_else(|| ParseError::new(start, "unterminated variable name"))?;
                let name = &rest[1..1 + closing];
                if name.is_empty() {
                    return Err(ParseError::new(start, "empty variable name"));
                }
                self.pos += closing + 2;
                Token::Variable(name.to_string())
            }
            '>' | '<' | '=' | '!' => {
                let two = &rest[..rest.len().min(2)];
                let (op, len) = match two {
                    ">=" => (Comparison::Ge, 2),
                    "<=" => (Comparison::Le, 2),
                    "==" => (Comparison::Eq, 2),
                    "!=" => (Comparison::Ne, 2),
                    _ if first == '>' => (Comparison::Gt, 1),
                    _ if first == '<' => (Comparison::Lt, 1),
                    _ => return Err(ParseError::new(start, format!("unknown operator {two:?}"))),
                };
                self.pos += len;
                Token::Op(op)
            }
            c if c.is_ascii_alphabetic() => {
                let end = rest
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(rest.len());
                let word = &rest[..end];
                let kind = match word {
                    "ensure" => ConstraintKind::Ensure,
                    "achieve" => ConstraintKind::Achieve,
                    "encourage" => ConstraintKind::Encourage,
                    other => {
                        return Err(ParseError::new(
                            start,
                            format!("unknown requirement kind {other:?}"),
                        ))
                    }
                };
                self.pos += end;
                Token::Keyword(kind)
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let end = rest
                    .find(|c: char| !(c.is_ascii_digit() || "+-.eE".contains(c)))
                    .unwrap_or(rest.len());
                let text = &rest[..end];
                let number = text
                    .parse::<f64>()
                    .map_err(|_| ParseError::new(start, format!("invalid number {text:?}")))?;
                self.pos += end;
                Token::Number(number)
            }
            other => {
                return Err(ParseError::new(
                    start,
                    format!("unexpected character {other:?}"),
                ))
            }
        };
        Ok(Some((start, token)))
    }
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    cursor: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(_, t)| t)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let item = self.tokens.get(self.cursor).cloned();
        self.cursor += item.is_some() as usize;
        item
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map(|(p, _)| *p)
            .unwrap_or(self.input_len)
    }

    fn constraint(&mut self) -> Result<Constraint, ParseError> {
        let kind = match self.next() {
            Some((_, Token::Keyword(kind))) => kind,
            Some((p, t)) => {
                return Err(ParseError::new(p, format!("expected requirement kind, found {t:?}")))
            }
            None => {
                return Err(ParseError::new(self.input_len, "expected requirement kind"))
            }
        };
        let variable = match self.next() {
            Some((_, Token::Variable(name))) => name,
            Some((p, t)) => {
                return Err(ParseError::new(p, format!("expected quoted variable, found {t:?}")))
            }
            None => return Err(ParseError::new(self.input_len, "expected quoted variable")),
        };
        let comparison = match self.next() {
            Some((_, Token::Op(op))) => op,
            Some((p, t)) => {
                return Err(ParseError::new(p, format!("expected comparison, found {t:?}")))
            }
            None => return Err(ParseError::new(self.input_len, "expected comparison")),
        };
        let value = match self.next() {
            Some((_, Token::Number(value))) => value,
            Some((p, t)) => {
                return Err(ParseError::new(p, format!("expected number, found {t:?}")))
            }
            None => return Err(ParseError::new(self.input_len, "expected number")),
        };
        Ok(Constraint {
            kind,
            variable,
            comparison,
            value,
        })
    }
}

/// Parse a requirement list: one constraint, or `[c1, c2, ...]`.
pub fn parse(input: &str) -> Result<Vec<Constraint>, ParseError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    let mut parser = Parser {
        tokens,
        cursor: 0,
        input_len: input.len(),
    };

    let mut constraints = Vec::new();
    if parser.peek() == Some(&Token::LBracket) {
        parser.next();
        loop {
            constraints.push(parser.constraint()?);
            match parser.next() {
                Some((_, Token::Comma)) => continue,
                Some((_, Token::RBracket)) => break,
                Some((p, t)) => {
                    return Err(ParseError::new(p, format!("expected ',' or ']', found {t:?}")))
                }
                None => return Err(ParseError::new(input.len(), "unterminated list")),
            }
        }
    } else {
        constraints.push(parser.constraint()?);
    }

    if parser.peek().is_some() {
        return Err(ParseError::new(
            parser.position(),
            "trailing input after requirement list",
        ));
    }
    Ok(constraints)
}
