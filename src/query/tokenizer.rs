use super::Token;
use crate::analysis::is_separator;

/// Splits an expression on ASCII whitespace, as documents are, detaching the parentheses glued to
/// the beginning or the end of a word: `((word` gives `(`, `(`, `word`.
pub fn tokenize(expression: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    let raws = expression
        .split(|c: char| c.is_ascii() && is_separator(c as u8))
        .filter(|raw| !raw.is_empty());
    for raw in raws {
        let rest = raw.trim_start_matches('(');
        for _ in 0..(raw.len() - rest.len()) {
            tokens.push(Token::Open);
        }

        let body = rest.trim_end_matches(')');
        if !body.is_empty() {
            tokens.push(Token::from(body));
        }
        for _ in 0..(rest.len() - body.len()) {
            tokens.push(Token::Close);
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::tokens;
    use rstest::rstest;

    #[rstest]
    #[case("(a + b) * c", &["(", "a", "+", "b", ")", "*", "c"])]
    #[case("3 * (x + 2)", &["3", "*", "(", "x", "+", "2", ")"])]
    #[case("variable", &["variable"])]
    #[case("", &[])]
    #[case("   ", &[])]
    #[case("x", &["x"])]
    #[case("()", &["(", ")"])]
    #[case("(word)", &["(", "word", ")"])]
    #[case(
        "(a + (b - c)) * (d / e)",
        &["(", "a", "+", "(", "b", "-", "c", ")", ")", "*", "(", "d", "/", "e", ")"]
    )]
    #[case(
        "((a + b) - c) * (d / e)",
        &["(", "(", "a", "+", "b", ")", "-", "c", ")", "*", "(", "d", "/", "e", ")"]
    )]
    #[case("cat\u{a0}dog\tOR\x0bbird", &["cat\u{a0}dog", "OR", "bird"])]
    #[case("((cat OR dog)) AND (bird", &["(", "(", "cat", "OR", "dog", ")", ")", "AND", "(", "bird"])]
    fn test_tokenize(#[case] expression: &str, #[case] expected: &[&str]) {
        assert_eq!(tokenize(expression), tokens(expected));
    }

    #[test]
    fn test_operators_are_recognized() {
        assert_eq!(
            tokenize("cat AND (dog OR)"),
            vec![
                Token::Word("cat".to_string()),
                Token::And,
                Token::Open,
                Token::Word("dog".to_string()),
                Token::Or,
                Token::Close
            ]
        );
    }
}
