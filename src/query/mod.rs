//! Boolean queries: words combined with `AND`, `OR` and parentheses.
//!
//! A raw expression is split into [`Token`]s by [`tokenize`], compiled into
//! a [`Postfix`] expression and evaluated against the document sets of its
//! words.

use std::fmt;

mod postfix;
mod tokenizer;

pub use postfix::Postfix;
pub use tokenizer::tokenize;

pub const AND: &str = "AND";
pub const OR: &str = "OR";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Word(String),
    And,
    Or,
    Open,
    Close,
}

impl Token {
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(word) => Some(word),
            _ => None,
        }
    }
}

impl From<&str> for Token {
    fn from(token: &str) -> Self {
        match token {
            AND => Token::And,
            OR => Token::Or,
            "(" => Token::Open,
            ")" => Token::Close,
            word => Token::Word(word.to_string()),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(word) => f.write_str(word),
            Token::And => f.write_str(AND),
            Token::Or => f.write_str(OR),
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
        }
    }
}

/// Keeps the operands of a token sequence, in order
pub fn extract_words(tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .filter_map(|token| token.as_word().map(str::to_string))
        .collect()
}

#[cfg(test)]
pub(crate) fn tokens(values: &[&str]) -> Vec<Token> {
    values.iter().map(|&value| Token::from(value)).collect()
}
