//! Runtime errors.

use std::rc::Rc;

use thiserror::Error;

use flock_ast::span::Span;

/// Error raised while evaluating a step.
///
/// Fatal to the current `run` call; the evaluator's state after a failed step
/// is undefined and the instance should be treated as unusable. The span is
/// attached at the innermost expression that carries one.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Option<Span>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind) -> Self {
        Self { kind, span: None }
    }

    /// Attach a span unless one is already set.
    pub fn at(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }
}

impl From<RuntimeErrorKind> for RuntimeError {
    fn from(kind: RuntimeErrorKind) -> Self {
        Self::new(kind)
    }
}

/// The failure categories of one step evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeErrorKind {
    #[error("identifier '{0}' does not exist")]
    Undefined(Rc<str>),

    #[error("'{0}' is already declared")]
    AlreadyDeclared(Rc<str>),

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("operator '{op}' requires {expected}, found {found}")]
    InvalidOperands {
        op: String,
        expected: &'static str,
        found: String,
    },

    #[error("condition of 'if' must be a boolean, found {found}")]
    ConditionNotBoolean { found: &'static str },

    #[error("call target must be a bare identifier naming a function")]
    CalleeNotIdentifier,

    #[error("'{name}' is not a function, found {found}")]
    NotAFunction { name: Rc<str>, found: &'static str },

    #[error("function '{name}' expects {expected} argument(s), got {found}")]
    WrongArity {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("invalid argument to '{name}': {message}")]
    InvalidArgument {
        name: &'static str,
        message: String,
    },

    #[error("member access requires an agent value, found {found}")]
    NotAnAgent { found: &'static str },

    #[error("agent '{id}' has no property '{name}'")]
    MissingProperty { id: Rc<str>, name: Rc<str> },

    #[error("agent '{id}' not found in population")]
    MissingAgent { id: Rc<str> },

    #[error("define '{name}' must be a number or boolean literal")]
    DefineNotLiteral { name: Rc<str> },

    #[error("count of agent '{agent}' {message}")]
    InvalidCount { agent: Rc<str>, message: String },

    #[error("comprehension base must be an agent list, found {found}")]
    ComprehensionBase { found: &'static str },

    #[error("comprehension produced {agents} agent(s) but {results} result(s)")]
    ComprehensionMismatch { agents: usize, results: usize },
}
