//! Configuration tokens.
//!
//! Built-in modules read their configuration (for example a bus width) from
//! the tokens the parser found between the module name and the argument
//! list. Placement directives are lexed into the same token type.

use copper_source::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Token payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TokenKind {
    /// Integer literal.
    Int(i64),
    /// Non-integer number.
    Number(f64),
    /// Identifier or keyword.
    Ident(String),
    /// Single punctuation character.
    Punct(char),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(v) => write!(f, "{v}"),
            TokenKind::Number(v) => write!(f, "{v}"),
            TokenKind::Ident(s) => f.write_str(s),
            TokenKind::Punct(c) => write!(f, "{c}"),
        }
    }
}

/// A token with its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Payload.
    #[serde(flatten)]
    pub kind: TokenKind,
    /// Location in the design source.
    #[serde(default)]
    pub span: Span,
}

impl Token {
    /// Creates a token with no location.
    pub fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            span: Span::DUMMY,
        }
    }

    /// Numeric value of an `Int` or `Number` token.
    pub fn as_number(&self) -> Option<f64> {
        match self.kind {
            TokenKind::Int(v) => Some(v as f64),
            TokenKind::Number(v) => Some(v),
            _ => None,
        }
    }
}

/// Splits text on whitespace into tokens.
///
/// Words that parse as integers or numbers become numeric tokens; everything
/// else is an identifier.
pub fn lex_words(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .map(|word| {
            let kind = if let Ok(v) = word.parse::<i64>() {
                TokenKind::Int(v)
            } else if let Ok(v) = word.parse::<f64>() {
                TokenKind::Number(v)
            } else {
                TokenKind::Ident(word.to_string())
            };
            Token::new(kind)
        })
        .collect()
}

/// A cursor over a token slice.
pub struct TokenStream<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenStream<'a> {
    /// Creates a cursor at the first token.
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// The next token without consuming it.
    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Consumes the next token.
    pub fn next_token(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// Consumes the next token if it is an integer.
    pub fn eat_int(&mut self) -> Option<(i64, Span)> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Int(v),
                span,
            }) => {
                self.pos += 1;
                Some((*v, *span))
            }
            _ => None,
        }
    }

    /// Returns `true` when every token was consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_directive_words() {
        let tokens = lex_words("offset 1.5  -2");
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident("offset".to_string()),
                TokenKind::Number(1.5),
                TokenKind::Int(-2),
            ]
        );
    }

    #[test]
    fn stream_cursor() {
        let tokens = lex_words("8 flip");
        let mut stream = TokenStream::new(&tokens);
        assert_eq!(stream.eat_int().map(|(v, _)| v), Some(8));
        assert!(stream.eat_int().is_none());
        assert_eq!(
            stream.next_token().map(|t| &t.kind),
            Some(&TokenKind::Ident("flip".to_string()))
        );
        assert!(stream.is_empty());
        assert!(stream.next_token().is_none());
    }

    #[test]
    fn deserialize_from_parser_output() {
        let token: Token = serde_json::from_str(
            r#"{"kind":"int","value":4,"span":{"file":0,"start":10,"end":11}}"#,
        )
        .unwrap();
        assert_eq!(token.kind, TokenKind::Int(4));
        assert_eq!(token.span.start, 10);

        let token: Token = serde_json::from_str(r##"{"kind":"punct","value":"#"}"##).unwrap();
        assert_eq!(token.kind, TokenKind::Punct('#'));
        assert!(token.span.is_dummy());
    }

    #[test]
    fn numbers_as_f64() {
        assert_eq!(Token::new(TokenKind::Int(3)).as_number(), Some(3.0));
        assert_eq!(Token::new(TokenKind::Ident("x".into())).as_number(), None);
    }
}
