use std::collections::HashMap;
use std::fmt;

use log::debug;

use super::Token;
use crate::base::DocIdSet;
use crate::error::{Error, Result};

/// A query in postfix order: operands are followed by their operator and
/// the expression contains no parenthesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Postfix {
    tokens: Vec<Token>,
}

impl Postfix {
    /// Shunting-yard compilation of an infix token sequence.
    ///
    /// `AND` binds tighter than `OR` and both are left-associative. Operands
    /// are buffered until the next operator or parenthesis: when words
    /// follow each other, only the last one is kept.
    pub fn compile(tokens: &[Token]) -> Result<Postfix> {
        let mut output = Vec::new();
        let mut stack: Vec<Token> = Vec::new();
        let mut operand: Option<&str> = None;

        for token in tokens {
            if let Token::Word(word) = token {
                if let Some(previous) = operand.replace(word.as_str()) {
                    debug!("Operand {} replaced by {}", previous, word);
                }
                continue;
            }

            if let Some(word) = operand.take() {
                output.push(Token::Word(word.to_string()));
            }

            match token {
                Token::Open => stack.push(Token::Open),
                Token::Close => loop {
                    match stack.pop() {
                        Some(Token::Open) => break,
                        Some(operator) => output.push(operator),
                        None => {
                            return Err(Error::Syntax(
                                "too many closing parentheses".to_string(),
                            ))
                        }
                    }
                },
                _ => {
                    while let Some(top) = stack.last() {
                        if *top != Token::Open && (*token == Token::Or || *top == Token::And) {
                            output.extend(stack.pop());
                        } else {
                            break;
                        }
                    }
                    stack.push(token.clone());
                }
            }
        }

        if let Some(word) = operand {
            output.push(Token::Word(word.to_string()));
        }

        while let Some(token) = stack.pop() {
            if token == Token::Open {
                return Err(Error::Syntax("unclosed opening parenthesis".to_string()));
            }
            output.push(token);
        }

        Ok(Postfix { tokens: output })
    }

    /// Wraps tokens that are already in postfix order
    pub fn from_tokens(tokens: Vec<Token>) -> Postfix {
        Postfix { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Distinct operands, in order of first appearance
    pub fn words(&self) -> Vec<&str> {
        let mut words: Vec<&str> = Vec::new();
        for word in self.tokens.iter().filter_map(Token::as_word) {
            if !words.contains(&word) {
                words.push(word);
            }
        }
        words
    }

    /// Evaluates the expression, `AND` being the intersection and `OR` the
    /// union of the document sets.
    ///
    /// Words without an entry in `operands` are skipped, which can leave an
    /// operator with less than two operands.
    pub fn evaluate(&self, operands: &HashMap<String, DocIdSet>) -> Result<DocIdSet> {
        let mut stack: Vec<DocIdSet> = Vec::new();

        for token in self.tokens.iter() {
            match token {
                Token::Word(word) => {
                    if let Some(docids) = operands.get(word) {
                        stack.push(docids.clone());
                    }
                }
                Token::And | Token::Or => {
                    let (right, left) = match (stack.pop(), stack.pop()) {
                        (Some(right), Some(left)) => (right, left),
                        _ => {
                            return Err(Error::Evaluation(format!(
                                "not enough operands for {}",
                                token
                            )))
                        }
                    };
                    let result = if *token == Token::And {
                        left.intersection(&right).copied().collect()
                    } else {
                        left.union(&right).copied().collect()
                    };
                    stack.push(result);
                }
                Token::Open | Token::Close => {
                    return Err(Error::Evaluation(format!(
                        "unexpected parenthesis in postfix expression {}",
                        self
                    )))
                }
            }
        }

        match stack.len() {
            1 => Ok(stack.pop().unwrap_or_default()),
            0 => Err(Error::Evaluation("empty expression".to_string())),
            n => Err(Error::Evaluation(format!(
                "{} operands left without operator",
                n
            ))),
        }
    }
}

impl fmt::Display for Postfix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", token)?;
        }
        Ok(())
    }
}
