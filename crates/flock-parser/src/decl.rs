//! Declaration parsing: `define` and `agent` blocks.

use flock_ast::ast::{AgentDecl, Decl, DefineDecl, Expr, ExprKind, MemberDecl, MemberKind};
use flock_lexer::Token;

use crate::error::ParseError;
use crate::expr::parse_expr;
use crate::stream::TokenStream;

/// Parse a single top-level declaration.
pub(crate) fn parse_declaration(stream: &mut TokenStream) -> Result<Decl, ParseError> {
    match stream.peek() {
        Some(Token::Define) => parse_define(stream).map(Decl::Define),
        Some(Token::Agent) => parse_agent(stream).map(Decl::Agent),
        other => Err(ParseError::unexpected_token(
            other,
            "at top level (expected 'define' or 'agent')",
            stream.current_span(),
        )),
    }
}

/// `define name = value ;`
fn parse_define(stream: &mut TokenStream) -> Result<DefineDecl, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Define)?;
    let (name, _) = stream.expect_ident()?;
    stream.expect(Token::Eq)?;
    let value = parse_expr(stream)?;
    stream.expect(Token::Semicolon)?;

    Ok(DefineDecl {
        name,
        value,
        span: stream.span_from(start),
    })
}

/// `agent name count { members }`
fn parse_agent(stream: &mut TokenStream) -> Result<AgentDecl, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::Agent)?;
    let (name, _) = stream.expect_ident()?;
    let count = parse_count(stream)?;

    stream.expect(Token::LBrace)?;
    let mut members = Vec::new();
    while !matches!(stream.peek(), Some(Token::RBrace)) {
        if stream.at_end() {
            return Err(ParseError::unexpected_token(
                None,
                &format!("in body of agent '{}' (missing '}}')", name),
                stream.current_span(),
            ));
        }
        members.push(parse_member(stream)?);
    }
    stream.expect(Token::RBrace)?;

    Ok(AgentDecl {
        name,
        count,
        members,
        span: stream.span_from(start),
    })
}

/// The instance count: a number literal or an identifier naming a define.
fn parse_count(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let span = stream.current_span();
    match stream.peek() {
        Some(Token::Number(n)) => {
            let n = *n;
            stream.advance();
            Ok(Expr::new(ExprKind::Number(n), span))
        }
        Some(Token::Ident(name)) => {
            let name = name.clone();
            stream.advance();
            Ok(Expr::new(ExprKind::Ident(name), span))
        }
        other => Err(ParseError::unexpected_token(
            other,
            "where an agent count (number or define name) was expected",
            span,
        )),
    }
}

/// `const name = value ;` or `property name [: default] = value ;`
fn parse_member(stream: &mut TokenStream) -> Result<MemberDecl, ParseError> {
    let start = stream.current_pos();
    let kind = match stream.peek() {
        Some(Token::Const) => MemberKind::Const,
        Some(Token::Property) => MemberKind::Property,
        other => {
            return Err(ParseError::unexpected_token(
                other,
                "in agent body (expected 'const' or 'property')",
                stream.current_span(),
            ));
        }
    };
    stream.advance();

    let (name, _) = stream.expect_ident()?;

    let default = if matches!(stream.peek(), Some(Token::Colon)) {
        let colon_span = stream.current_span();
        if kind == MemberKind::Const {
            return Err(ParseError::invalid_syntax(
                format!("const '{}' cannot declare a default value", name),
                colon_span,
            ));
        }
        stream.advance();
        Some(parse_expr(stream)?)
    } else {
        None
    };

    stream.expect(Token::Eq)?;
    let value = parse_expr(stream)?;
    stream.expect(Token::Semicolon)?;

    Ok(MemberDecl {
        kind,
        name,
        default,
        value,
        span: stream.span_from(start),
    })
}
