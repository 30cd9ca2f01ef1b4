// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Unified front end for the Flock pipeline.
//!
//! [`parse`] runs lex → parse → resolve and returns either a validated,
//! dependency-ordered [`Program`] ready for the evaluator, or a single
//! [`CompileError`] with the message and 1-based line/column of the first
//! failure. Lexical, parse and resolution errors all abort the whole call
//! with no partial program.

use std::fmt;

use flock_ast::ast::Program;
use flock_ast::span::{SourceFile, Span};

/// A diagnostic from any front-end phase.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    /// 1-based line of the first offending character, when known.
    pub line: Option<u32>,
    /// 1-based column of the first offending character, when known.
    pub column: Option<u32>,
}

impl CompileError {
    fn new(message: String, span: Option<Span>, file: &SourceFile) -> Self {
        let position = span.map(|span| file.line_col(span.start));
        Self {
            message,
            line: position.map(|(line, _)| line),
            column: position.map(|(_, column)| column),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "error at {}:{}: {}", line, column, self.message)
            }
            _ => write!(f, "error: {}", self.message),
        }
    }
}

impl std::error::Error for CompileError {}

/// Parse source text into a validated, dependency-ordered program.
pub fn parse(source: &str) -> Result<Program, CompileError> {
    let file = SourceFile::new(source);

    let tokens = flock_lexer::lex(source)
        .map_err(|err| CompileError::new(err.to_string(), Some(err.span()), &file))?;

    let mut program = flock_parser::parse_program(&tokens)
        .map_err(|err| CompileError::new(err.message.clone(), Some(err.span), &file))?;

    flock_resolve::resolve(&mut program)
        .map_err(|err| CompileError::new(err.to_string(), Some(err.span()), &file))?;

    Ok(program)
}
