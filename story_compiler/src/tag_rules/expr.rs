//! Expression trees built from a checked token stream.

use std::fmt;

use super::token::Token;
use super::{TagRuleError, TagSet};

/// A node of a parsed tag rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// True when the tag is present.
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Build the tree for `tokens[..]`.
    pub fn parse(tokens: &[Token<'_>]) -> Result<Self, TagRuleError> {
        parse_range(tokens, 0, tokens.len())
    }

    /// Evaluate against a tag set. Both operands of a binary node are always
    /// evaluated.
    pub fn evaluate(&self, tags: &TagSet) -> bool {
        match self {
            Expr::Tag(tag) => tags.contains(tag),
            Expr::Not(inner) => !inner.evaluate(tags),
            Expr::And(left, right) => {
                let (l, r) = (left.evaluate(tags), right.evaluate(tags));
                l & r
            }
            Expr::Or(left, right) => {
                let (l, r) = (left.evaluate(tags), right.evaluate(tags));
                l | r
            }
        }
    }

    /// Every tag the expression mentions, in left-to-right order.
    pub fn referenced_tags(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_tags(&mut out);
        out
    }

    fn collect_tags<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Tag(tag) => out.push(tag),
            Expr::Not(inner) => inner.collect_tags(out),
            Expr::And(left, right) | Expr::Or(left, right) => {
                left.collect_tags(out);
                right.collect_tags(out);
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Tag(tag) => write!(f, "{}", tag),
            Expr::Not(inner) => write!(f, "!{}", inner),
            Expr::And(left, right) => write!(f, "({} && {})", left, right),
            Expr::Or(left, right) => write!(f, "({} || {})", left, right),
        }
    }
}

fn malformed(reason: impl Into<String>) -> TagRuleError {
    TagRuleError::Evaluation {
        reason: reason.into(),
    }
}

/// Recursive descent over `tokens[start..end]`.
fn parse_range(tokens: &[Token<'_>], start: usize, end: usize) -> Result<Expr, TagRuleError> {
    if start >= end {
        return Err(malformed("empty sub-expression"));
    }

    if end - start == 1 {
        return match tokens[start] {
            Token::Ident(tag) => Ok(Expr::Tag(tag.to_string())),
            other => Err(malformed(format!("unexpected lone token {:?}", other))),
        };
    }

    // Binary operators at parenthesis depth zero. `||` roots the tree when
    // present, otherwise the first `&&`.
    let mut depth = 0usize;
    let mut first_and = None;
    let mut first_or = None;
    for (i, token) in tokens.iter().enumerate().take(end).skip(start) {
        match token {
            Token::Open => depth += 1,
            Token::Close => depth = depth.saturating_sub(1),
            Token::Or if depth == 0 && first_or.is_none() => first_or = Some(i),
            Token::And if depth == 0 && first_and.is_none() => first_and = Some(i),
            _ => {}
        }
    }

    if let Some(i) = first_or {
        let left = parse_range(tokens, start, i)?;
        let right = parse_range(tokens, i + 1, end)?;
        return Ok(Expr::Or(Box::new(left), Box::new(right)));
    }
    if let Some(i) = first_and {
        let left = parse_range(tokens, start, i)?;
        let right = parse_range(tokens, i + 1, end)?;
        return Ok(Expr::And(Box::new(left), Box::new(right)));
    }

    match tokens[start] {
        Token::Open => {
            if matching_close(tokens, start, end) != Some(end - 1) {
                return Err(malformed("parenthesised group does not span the sub-expression"));
            }
            parse_range(tokens, start + 1, end - 1)
        }
        Token::Not => Ok(Expr::Not(Box::new(parse_range(tokens, start + 1, end)?))),
        other => Err(malformed(format!(
            "malformed expression tree near {:?}",
            other
        ))),
    }
}

fn matching_close(tokens: &[Token<'_>], open: usize, end: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().take(end).skip(open) {
        match token {
            Token::Open => depth += 1,
            Token::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
