//! Rule tokenizer - splits a rule into tokens and rejects malformed shapes.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{TagRuleError, TokenizationFault};

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z][A-Za-z0-9_]*|\|\||&&|!|\(|\)").expect("token pattern is valid")
});

/// A single token of a tag rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Ident(&'a str),
    And,
    Or,
    Not,
    Open,
    Close,
}

impl<'a> Token<'a> {
    fn from_lexeme(lexeme: &'a str) -> Self {
        match lexeme {
            "&&" => Token::And,
            "||" => Token::Or,
            "!" => Token::Not,
            "(" => Token::Open,
            ")" => Token::Close,
            ident => Token::Ident(ident),
        }
    }

    /// `&&` and `||`.
    pub fn is_binary(&self) -> bool {
        matches!(self, Token::And | Token::Or)
    }

    pub fn is_ident(&self) -> bool {
        matches!(self, Token::Ident(_))
    }

    fn as_str(&self) -> &'a str {
        match self {
            Token::Ident(s) => s,
            Token::And => "&&",
            Token::Or => "||",
            Token::Not => "!",
            Token::Open => "(",
            Token::Close => ")",
        }
    }
}

/// Tokenize a rule and run every structural check on the token stream.
///
/// Checks run in a fixed order and the first failing one is reported.
pub fn tokenize(rule: &str) -> Result<Vec<Token<'_>>, TagRuleError> {
    let tokens: Vec<Token<'_>> = TOKEN_RE
        .find_iter(rule)
        .map(|m| Token::from_lexeme(m.as_str()))
        .collect();

    if tokens.is_empty() {
        return Err(TokenizationFault::Empty.into());
    }

    // Stray characters are whatever the token stream does not account for.
    let rebuilt: String = tokens.iter().map(Token::as_str).collect();
    let stripped: String = rule.chars().filter(|c| !c.is_whitespace()).collect();
    if rebuilt != stripped {
        return Err(TokenizationFault::InvalidCharacters.into());
    }

    let mut depth: i64 = 0;
    for token in &tokens {
        match token {
            Token::Open => depth += 1,
            Token::Close => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return Err(TokenizationFault::UnbalancedClosing.into());
        }
    }
    if depth > 0 {
        return Err(TokenizationFault::UnbalancedOpening.into());
    }

    if tokens.windows(2).any(|w| w[0].is_ident() && w[1].is_ident()) {
        return Err(TokenizationFault::ConsecutiveTags.into());
    }

    if tokens.windows(2).any(|w| w[0].is_binary() && w[1].is_binary()) {
        return Err(TokenizationFault::ConsecutiveOperators.into());
    }

    if tokens.windows(3).any(|w| {
        w[1].is_binary() && (w[0] == Token::Open || w[2] == Token::Close)
    }) {
        return Err(TokenizationFault::OperatorNextToParenthesis.into());
    }

    if tokens[0].is_binary() {
        return Err(TokenizationFault::LeadingOperator.into());
    }
    if tokens[tokens.len() - 1].is_binary() {
        return Err(TokenizationFault::TrailingOperator.into());
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fault(rule: &str) -> TokenizationFault {
        match tokenize(rule) {
            Err(TagRuleError::Tokenization(fault)) => fault,
            other => panic!("expected tokenization error for {rule:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_tokenize_simple() {
        let tokens = tokenize("(a || b) && !c").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Open,
                Token::Ident("a"),
                Token::Or,
                Token::Ident("b"),
                Token::Close,
                Token::And,
                Token::Not,
                Token::Ident("c"),
            ]
        );
    }

    #[test]
    fn test_whitespace_is_irrelevant() {
        assert_eq!(tokenize("a&&b").unwrap(), tokenize("  a &&\tb ").unwrap());
    }

    #[test]
    fn test_identifier_with_digits_and_underscores() {
        assert_eq!(tokenize("room_2B").unwrap(), vec![Token::Ident("room_2B")]);
    }

    #[test]
    fn test_invalid_characters() {
        assert_eq!(fault("a & b"), TokenizationFault::InvalidCharacters);
        assert_eq!(fault("a - b"), TokenizationFault::InvalidCharacters);
        // rule identifiers cannot start with a digit or an underscore
        assert_eq!(fault("1a"), TokenizationFault::InvalidCharacters);
        assert_eq!(fault("_a"), TokenizationFault::InvalidCharacters);
    }

    #[test]
    fn test_empty_rule() {
        assert_eq!(fault(""), TokenizationFault::Empty);
        assert_eq!(fault("   "), TokenizationFault::Empty);
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert_eq!(fault("(a"), TokenizationFault::UnbalancedOpening);
        assert_eq!(fault("a)"), TokenizationFault::UnbalancedClosing);
        assert_eq!(fault(")a("), TokenizationFault::UnbalancedClosing);
    }

    #[test]
    fn test_consecutive_tags() {
        assert_eq!(fault("a b"), TokenizationFault::ConsecutiveTags);
        assert_eq!(fault("a && b c"), TokenizationFault::ConsecutiveTags);
    }

    #[test]
    fn test_consecutive_operators() {
        assert_eq!(fault("a && && b"), TokenizationFault::ConsecutiveOperators);
        assert_eq!(fault("a || && b"), TokenizationFault::ConsecutiveOperators);
    }

    #[test]
    fn test_operator_next_to_parenthesis() {
        assert_eq!(fault("a && (|| b)"), TokenizationFault::OperatorNextToParenthesis);
        assert_eq!(fault("(a &&) || b"), TokenizationFault::OperatorNextToParenthesis);
    }

    #[test]
    fn test_operator_at_the_edges() {
        assert_eq!(fault("&& a"), TokenizationFault::LeadingOperator);
        assert_eq!(fault("a &&"), TokenizationFault::TrailingOperator);
        assert_eq!(fault("a ||"), TokenizationFault::TrailingOperator);
    }
}
