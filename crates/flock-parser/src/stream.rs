//! Token stream wrapper for the hand-written parser.

use std::rc::Rc;

use flock_ast::span::Span;
use flock_lexer::{Spanned, Token};

use crate::error::ParseError;

/// Token stream with lookahead and span tracking.
///
/// Each token carries its byte span from the source. The end of the stream is
/// the end marker: [`TokenStream::current_span`] past the final token yields a
/// zero-length span one past the last token (or `{0, 0}` for empty input,
/// which maps to line 1, column 1).
pub struct TokenStream<'src> {
    tokens: &'src [Spanned<Token>],
    pos: usize,
}

impl<'src> TokenStream<'src> {
    pub fn new(tokens: &'src [Spanned<Token>]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Advance to the next token and return the consumed one.
    pub fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|t| &t.token);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if the current token matches the expected token kind.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Expect a specific token and advance past it.
    pub fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        if self.check(&expected) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(ParseError::expected_token(
                &expected,
                self.peek(),
                self.current_span(),
            ))
        }
    }

    /// Expect an identifier and advance past it.
    pub fn expect_ident(&mut self) -> Result<(Rc<str>, Span), ParseError> {
        let span = self.current_span();
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.advance();
                Ok((name, span))
            }
            found => Err(ParseError::unexpected_token(
                found,
                "where an identifier was expected",
                span,
            )),
        }
    }

    /// Check if the end marker has been reached.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Current position in the token stream, for [`TokenStream::span_from`].
    pub fn current_pos(&self) -> usize {
        self.pos
    }

    /// Span covering tokens from `start` up to the last consumed token.
    pub fn span_from(&self, start: usize) -> Span {
        let start_byte = match self.tokens.get(start) {
            Some(t) => t.span.start,
            None => return self.current_span(),
        };
        let end_byte = if self.pos > 0 {
            self.tokens
                .get(self.pos - 1)
                .map(|t| t.span.end)
                .unwrap_or(start_byte)
        } else {
            start_byte
        };
        Span::new(start_byte, end_byte)
    }

    /// Span of the current token, or the synthesized end-of-input span.
    pub fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(t) => t.span,
            None => match self.tokens.last() {
                Some(t) => Span::at(t.span.end),
                None => Span::at(0),
            },
        }
    }
}
