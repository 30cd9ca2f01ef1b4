// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Lexical analysis for Flock source text.
//!
//! Tokenization uses logos. [`lex`] turns a source string into a vector of
//! span-tagged tokens; the stream's end acts as the end marker (the parser
//! synthesizes an end-of-input span one past the final token).
//!
//! Comments open with `#` and run to the next `#`. An unterminated comment,
//! a numeric literal with a second decimal point, and any character outside
//! the language are all fatal lexical errors carrying the offending span.

use std::rc::Rc;

use logos::Logos;
use thiserror::Error;

use flock_ast::span::Span;

/// Internal error kind produced while a token is being matched.
///
/// The [`lex`] wrapper pairs this with the offending span and slice to build
/// the public [`LexError`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LexErrorKind {
    #[default]
    UnrecognizedCharacter,
    SecondDecimalPoint,
    UnterminatedComment,
}

fn second_decimal_point(_: &mut logos::Lexer<'_, Token>) -> Result<(), LexErrorKind> {
    Err(LexErrorKind::SecondDecimalPoint)
}

fn unterminated_comment(_: &mut logos::Lexer<'_, Token>) -> Result<(), LexErrorKind> {
    Err(LexErrorKind::UnterminatedComment)
}

/// Flock token.
///
/// Keywords are resolved here rather than in the parser: an identifier run
/// matching a reserved word lexes as its keyword token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^#]*#")]
#[logos(error = LexErrorKind)]
pub enum Token {
    // === Keywords ===
    #[token("agent")]
    Agent,
    #[token("define")]
    Define,
    #[token("const")]
    Const,
    #[token("property")]
    Property,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("otherwise")]
    Otherwise,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // === Operators ===
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("=")]
    Eq,
    #[token("!")]
    Bang,
    /// Set-comprehension arrow
    #[token("=>")]
    FatArrow,
    /// Reserved; no grammar production consumes it
    #[token("->")]
    Arrow,

    // === Punctuation ===
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // === Literals ===
    /// Number literal: a digit run with at most one decimal point.
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    /// A digit run with two or more decimal points. Never constructed; the
    /// callback always raises [`LexErrorKind::SecondDecimalPoint`].
    #[regex(r"[0-9]+(\.[0-9]+){2,}", second_decimal_point)]
    MalformedNumber,

    /// A `#` comment with no closing `#` before end of input. Never
    /// constructed; the callback always raises
    /// [`LexErrorKind::UnterminatedComment`].
    #[regex(r"#[^#]*", unterminated_comment)]
    UnterminatedComment,

    /// Identifier: alphabetic start, then letters, digits and underscores.
    ///
    /// Uses `Rc<str>` for cheap cloning throughout the parser pipeline.
    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*", |lex| Rc::from(lex.slice()))]
    Ident(Rc<str>),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Token::Agent => "agent",
            Token::Define => "define",
            Token::Const => "const",
            Token::Property => "property",
            Token::If => "if",
            Token::Then => "then",
            Token::Else => "else",
            Token::And => "and",
            Token::Or => "or",
            Token::Otherwise => "otherwise",
            Token::True => "true",
            Token::False => "false",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::EqEq => "==",
            Token::BangEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::Eq => "=",
            Token::Bang => "!",
            Token::FatArrow => "=>",
            Token::Arrow => "->",
            Token::Dot => ".",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Number(n) => return write!(f, "{}", n),
            Token::MalformedNumber => "<malformed number>",
            Token::UnterminatedComment => "<unterminated comment>",
            Token::Ident(id) => return write!(f, "{}", id),
        };
        write!(f, "{}", s)
    }
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub token: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(token: T, span: Span) -> Self {
        Self { token, span }
    }
}

/// Error during lexing. Fatal for the whole tokenization call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unrecognized character '{slice}'")]
    UnrecognizedCharacter { slice: String, span: Span },

    #[error("numeric literal '{slice}' has a second decimal point")]
    SecondDecimalPoint { slice: String, span: Span },

    #[error("unterminated comment (missing closing '#')")]
    UnterminatedComment { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnrecognizedCharacter { span, .. }
            | LexError::SecondDecimalPoint { span, .. }
            | LexError::UnterminatedComment { span } => *span,
        }
    }
}

/// Tokenize source text into a vector of spanned tokens.
///
/// The first lexical error aborts the call; there is no partial-token
/// recovery.
pub fn lex(source: &str) -> Result<Vec<Spanned<Token>>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start as u32, range.end as u32);
        match result {
            Ok(token) => tokens.push(Spanned::new(token, span)),
            Err(kind) => {
                return Err(match kind {
                    LexErrorKind::UnrecognizedCharacter => LexError::UnrecognizedCharacter {
                        slice: lexer.slice().to_string(),
                        span,
                    },
                    LexErrorKind::SecondDecimalPoint => LexError::SecondDecimalPoint {
                        slice: lexer.slice().to_string(),
                        span,
                    },
                    LexErrorKind::UnterminatedComment => LexError::UnterminatedComment { span },
                });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_ok(source: &str) -> Vec<Token> {
        lex(source)
            .unwrap()
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    fn ident(s: &str) -> Token {
        Token::Ident(Rc::from(s))
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(lex("").unwrap(), vec![]);
    }

    #[test]
    fn test_keywords() {
        let tokens = lex_ok("agent define const property if then else and or otherwise");
        assert_eq!(
            tokens,
            vec![
                Token::Agent,
                Token::Define,
                Token::Const,
                Token::Property,
                Token::If,
                Token::Then,
                Token::Else,
                Token::And,
                Token::Or,
                Token::Otherwise,
            ]
        );
    }

    #[test]
    fn test_booleans() {
        assert_eq!(lex_ok("true false"), vec![Token::True, Token::False]);
    }

    #[test]
    fn test_identifiers() {
        let tokens = lex_ok("person infected x_pos speed2");
        assert_eq!(
            tokens,
            vec![
                ident("person"),
                ident("infected"),
                ident("x_pos"),
                ident("speed2"),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = lex_ok("42 3.14 0.5 10");
        assert_eq!(
            tokens,
            vec![
                Token::Number(42.0),
                Token::Number(3.14),
                Token::Number(0.5),
                Token::Number(10.0),
            ]
        );
    }

    #[test]
    fn test_second_decimal_point() {
        let err = lex("1.2.3").unwrap_err();
        assert!(err.to_string().contains("decimal point"), "{}", err);
        assert_eq!(err.span(), Span::new(0, 5));
    }

    #[test]
    fn test_unrecognized_character() {
        let err = lex("agent @ person").unwrap_err();
        assert!(err.to_string().contains("Unrecognized character"), "{}", err);
        assert_eq!(err.span(), Span::new(6, 7));
    }

    #[test]
    fn test_operators() {
        let tokens = lex_ok("+ - * / % == != < <= > >= = ! => ->");
        assert_eq!(
            tokens,
            vec![
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
                Token::EqEq,
                Token::BangEq,
                Token::Lt,
                Token::LtEq,
                Token::Gt,
                Token::GtEq,
                Token::Eq,
                Token::Bang,
                Token::FatArrow,
                Token::Arrow,
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        let tokens = lex_ok(". , ; : ( ) { }");
        assert_eq!(
            tokens,
            vec![
                Token::Dot,
                Token::Comma,
                Token::Semicolon,
                Token::Colon,
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = lex_ok("agent # a comment # person");
        assert_eq!(tokens, vec![Token::Agent, ident("person")]);
    }

    #[test]
    fn test_comment_spanning_lines() {
        let tokens = lex_ok("agent # line one\nline two # person");
        assert_eq!(tokens, vec![Token::Agent, ident("person")]);
    }

    #[test]
    fn test_unterminated_comment() {
        let err = lex("agent # never closed").unwrap_err();
        assert!(err.to_string().contains("unterminated comment"), "{}", err);
    }

    #[test]
    fn test_agent_declaration() {
        let spanned = lex("agent person 10 {}").unwrap();
        let tokens: Vec<Token> = spanned.iter().map(|s| s.token.clone()).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Agent,
                ident("person"),
                Token::Number(10.0),
                Token::LBrace,
                Token::RBrace,
            ]
        );
        // The final token ends exactly at the end of the source, so the
        // synthesized end-of-input marker sits one past the last character.
        assert_eq!(spanned.last().unwrap().span.end, 18);
    }

    #[test]
    fn test_member_declaration() {
        let tokens = lex_ok("property x: 0 = x + speed;");
        assert_eq!(
            tokens,
            vec![
                Token::Property,
                ident("x"),
                Token::Colon,
                Token::Number(0.0),
                Token::Eq,
                ident("x"),
                Token::Plus,
                ident("speed"),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_comprehension_arrow() {
        let tokens = lex_ok("agents(person) => p => p.infected");
        assert_eq!(
            tokens,
            vec![
                ident("agents"),
                Token::LParen,
                ident("person"),
                Token::RParen,
                Token::FatArrow,
                ident("p"),
                Token::FatArrow,
                ident("p"),
                Token::Dot,
                ident("infected"),
            ]
        );
    }
}
