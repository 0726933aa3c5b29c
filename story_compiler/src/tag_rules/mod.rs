//! Tag rules - a small boolean language over snippet tags.
//!
//! A rule such as `(forest || cave) && !daylight` is processed in three
//! stages, each failing fast:
//! 1. **Tokenize**: split into identifiers, `&&`, `||`, `!`, `(` and `)` and
//!    reject malformed token sequences
//! 2. **Parse**: build an [`Expr`] tree, `||` binding looser than `&&`,
//!    which binds looser than `!`
//! 3. **Evaluate**: test the tree against a [`TagSet`]
//!
//! The tag list itself is validated before the rule is even tokenized.

mod expr;
mod tags;
mod token;

pub use expr::*;
pub use tags::*;
pub use token::{tokenize, Token};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What exactly is wrong with a rule's token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenizationFault {
    Empty,
    InvalidCharacters,
    UnbalancedClosing,
    UnbalancedOpening,
    ConsecutiveTags,
    ConsecutiveOperators,
    OperatorNextToParenthesis,
    LeadingOperator,
    TrailingOperator,
}

impl fmt::Display for TokenizationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            TokenizationFault::Empty => "empty expression",
            TokenizationFault::InvalidCharacters => "invalid characters found in the expression",
            TokenizationFault::UnbalancedClosing => {
                "unbalanced parentheses (more closing than opening)"
            }
            TokenizationFault::UnbalancedOpening => {
                "unbalanced parentheses (more opening than closing)"
            }
            TokenizationFault::ConsecutiveTags => "consecutive tags found in the expression",
            TokenizationFault::ConsecutiveOperators => {
                "consecutive operators found in the expression"
            }
            TokenizationFault::OperatorNextToParenthesis => {
                "operator found next to parentheses in the expression"
            }
            TokenizationFault::LeadingOperator => "operator found at the beginning of the expression",
            TokenizationFault::TrailingOperator => "operator found at the end of the expression",
        };
        f.write_str(msg)
    }
}

/// Errors raised while checking or evaluating a tag rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagRuleError {
    /// The rule text is not a well-formed token sequence.
    #[error("malformed tag rule: {0}")]
    Tokenization(TokenizationFault),

    /// The tokens do not form a valid expression tree.
    #[error("invalid tag rule: {reason}")]
    Evaluation { reason: String },

    /// A snippet carries a tag that does not match `[A-Za-z_][A-Za-z0-9_]*`.
    #[error("invalid tag \"{tag}\"")]
    Tag { tag: String },
}

impl From<TokenizationFault> for TagRuleError {
    fn from(fault: TokenizationFault) -> Self {
        TagRuleError::Tokenization(fault)
    }
}

/// A rule that has been tokenized and parsed once and can be evaluated
/// against any number of tag sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    source: String,
    expr: Expr,
}

impl CompiledRule {
    /// Tokenize and parse a rule.
    pub fn compile(rule: &str) -> Result<Self, TagRuleError> {
        let tokens = tokenize(rule)?;
        let expr = Expr::parse(&tokens)?;
        Ok(Self {
            source: rule.to_string(),
            expr,
        })
    }

    /// The rule text as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn matches(&self, tags: &TagSet) -> bool {
        self.expr.evaluate(tags)
    }
}

impl FromStr for CompiledRule {
    type Err = TagRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Evaluate `rule` against an already validated tag set.
pub fn evaluate_rule(rule: &str, tags: &TagSet) -> Result<bool, TagRuleError> {
    Ok(CompiledRule::compile(rule)?.matches(tags))
}

/// Evaluate `rule` against a whitespace-delimited tag list.
///
/// The tag list is validated first, so a malformed tag is reported even when
/// the rule is malformed too.
///
/// ```
/// use story_compiler::evaluate;
///
/// assert_eq!(evaluate("a && b", "a b"), Ok(true));
/// assert_eq!(evaluate("a && b", "a"), Ok(false));
/// assert!(evaluate("a && b b", "a b").is_err());
/// ```
pub fn evaluate(rule: &str, tag_list: &str) -> Result<bool, TagRuleError> {
    let tags = TagSet::parse(tag_list)?;
    evaluate_rule(rule, &tags)
}
