//! Tokenizer for shorthand expressions.
//!
//! Converts an expression such as `(squat.starting_weight + 20) * 0.9`
//! into a flat sequence of tokens. Tokens are produced lazily by
//! [`Lexer`]; [`tokenize`] collects them.

use crate::{Error, Result};
use std::fmt;
use std::iter::{Enumerate, Peekable};
use std::str::Chars;

/// A single lexical unit of a shorthand expression
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Identifier(String),
    Numeric(String),
    /// `(` or `)`
    Delimiter(char),
    /// One of `+ - * / @`
    Operator(char),
    /// A run of one or more whitespace characters
    Whitespace,
}

impl Token {
    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(text) | Token::Numeric(text) => write!(f, "{}", text),
            Token::Delimiter(c) | Token::Operator(c) => write!(f, "{}", c),
            Token::Whitespace => write!(f, " "),
        }
    }
}

/// Lazy tokenizer over an expression string
///
/// Yields `Err` once on the first invalid character and then stops.
pub struct Lexer<'a> {
    chars: Peekable<Enumerate<Chars<'a>>>,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().enumerate().peekable(),
            failed: false,
        }
    }

    fn lex_numeric(&mut self, first: char) -> Result<Token> {
        let mut text = String::from(first);
        while let Some(&(pos, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' {
                if text.contains('.') {
                    return Err(Error::InvalidToken(format!(
                        "invalid numeric at position {}",
                        pos
                    )));
                }
                text.push(c);
            } else {
                break;
            }
            self.chars.next();
        }
        Ok(Token::Numeric(text))
    }

    fn lex_identifier(&mut self, first: char) -> Token {
        let mut text = String::from(first);
        while let Some(&(_, c)) = self.chars.peek() {
            if !is_identifier_continue(c) {
                break;
            }
            text.push(c);
            self.chars.next();
        }
        Token::Identifier(text)
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let (pos, c) = self.chars.next()?;
        let token = match c {
            c if c.is_ascii_digit() || c == '.' => self.lex_numeric(c),
            c if is_identifier_start(c) => Ok(self.lex_identifier(c)),
            c if c.is_whitespace() => {
                self.skip_whitespace();
                Ok(Token::Whitespace)
            }
            '(' | ')' => Ok(Token::Delimiter(c)),
            '+' | '-' | '*' | '/' | '@' => Ok(Token::Operator(c)),
            other => Err(Error::InvalidToken(format!(
                "invalid token {:?} at position {}",
                other, pos
            ))),
        };

        if token.is_err() {
            self.failed = true;
        }
        Some(token)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

// `-` continues an identifier (`a-b` is one name); `.` joins an exercise
// and its property (`squat.starting_weight`).
fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Tokenize an entire expression
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let tokens = Lexer::new(input).collect::<Result<Vec<_>>>()?;
    tracing::trace!(input, ?tokens, "tokenized expression");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(s: &str) -> Token {
        Token::Identifier(s.into())
    }

    fn num(s: &str) -> Token {
        Token::Numeric(s.into())
    }

    #[test]
    fn test_single_whitespace() {
        assert_eq!(tokenize(" ").unwrap(), vec![Token::Whitespace]);
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(tokenize("   \t ").unwrap(), vec![Token::Whitespace]);
    }

    #[test]
    fn test_numerics() {
        assert_eq!(
            tokenize("1 0.1 .1").unwrap(),
            vec![
                num("1"),
                Token::Whitespace,
                num("0.1"),
                Token::Whitespace,
                num(".1"),
            ]
        );
    }

    #[test]
    fn test_numeric_with_two_decimal_points() {
        let err = tokenize("1.1.1").unwrap_err();
        assert!(matches!(err, Error::InvalidToken(_)));
        assert!(err.to_string().contains("position 3"));
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            tokenize("Aardvark aardvark _aardvark Hello_world-").unwrap(),
            vec![
                ident("Aardvark"),
                Token::Whitespace,
                ident("aardvark"),
                Token::Whitespace,
                ident("_aardvark"),
                Token::Whitespace,
                ident("Hello_world-"),
            ]
        );
    }

    #[test]
    fn test_hyphen_continues_identifier() {
        assert_eq!(tokenize("a-b").unwrap(), vec![ident("a-b")]);
        assert_eq!(
            tokenize("a - b").unwrap(),
            vec![
                ident("a"),
                Token::Whitespace,
                Token::Operator('-'),
                Token::Whitespace,
                ident("b"),
            ]
        );
    }

    #[test]
    fn test_property_identifier() {
        assert_eq!(
            tokenize("squat.starting_weight+20").unwrap(),
            vec![
                ident("squat.starting_weight"),
                Token::Operator('+'),
                num("20"),
            ]
        );
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(
            tokenize("()").unwrap(),
            vec![Token::Delimiter('('), Token::Delimiter(')')]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokenize("+-/*@").unwrap(),
            "+-/*@".chars().map(Token::Operator).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_numeric_followed_by_identifier_splits() {
        assert_eq!(tokenize("2x").unwrap(), vec![num("2"), ident("x")]);
    }

    #[test]
    fn test_unsupported_token() {
        let err = tokenize("%").unwrap_err();
        assert!(matches!(err, Error::InvalidToken(_)));
        assert!(matches!(tokenize("2 % 3"), Err(Error::InvalidToken(_))));
    }

    #[test]
    fn test_lexer_stops_after_error() {
        let mut lexer = Lexer::new("1 $ 2");
        assert_eq!(lexer.next().unwrap().unwrap(), num("1"));
        assert_eq!(lexer.next().unwrap().unwrap(), Token::Whitespace);
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
    }
}
