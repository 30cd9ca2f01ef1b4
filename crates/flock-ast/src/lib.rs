//! AST and source spans for the Flock language.
//!
//! This crate is the shared vocabulary of the pipeline: the lexer produces
//! span-tagged tokens, the parser builds the node types defined here, the
//! resolver reorders declaration lists in place, and the runtime walks the
//! finished tree.

pub mod ast;
pub mod span;

pub use ast::{
    AgentDecl, BinaryOp, Decl, DefineDecl, Expr, ExprKind, LogicalOp, MemberDecl, MemberKind,
    Program, UnaryOp,
};
pub use span::{SourceFile, Span};
