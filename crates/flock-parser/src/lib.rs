// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Recursive-descent parser for Flock.
//!
//! Consumes the spanned token stream produced by `flock-lexer` and builds the
//! `flock-ast` program tree. Expressions are parsed with precedence climbing
//! driven by a single operator-info table; declarations are parsed by plain
//! recursive descent. The first error aborts the parse; there is no
//! recovery or error-list accumulation.

mod decl;
mod error;
mod expr;
mod stream;

pub use error::{ParseError, ParseErrorKind};
pub use stream::TokenStream;

use flock_ast::ast::Program;
use flock_lexer::{Spanned, Token};

/// Parse a token stream into a program.
///
/// A program is a sequence of `define` and `agent` declarations; anything
/// else at the top level is a parse error.
pub fn parse_program(tokens: &[Spanned<Token>]) -> Result<Program, ParseError> {
    let mut stream = TokenStream::new(tokens);
    let mut body = Vec::new();
    while !stream.at_end() {
        body.push(decl::parse_declaration(&mut stream)?);
    }
    Ok(Program { body })
}
