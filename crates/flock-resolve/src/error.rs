//! Resolution errors.

use std::rc::Rc;

use thiserror::Error;

use flock_ast::span::Span;

/// Errors raised during static validation and dependency ordering.
///
/// All of them abort resolution for the whole program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("duplicate define '{name}'")]
    DuplicateDefine { name: Rc<str>, span: Span },

    #[error("duplicate agent type '{name}'")]
    DuplicateAgent { name: Rc<str>, span: Span },

    #[error("duplicate member '{name}' in agent '{agent}'")]
    DuplicateMember {
        name: Rc<str>,
        agent: Rc<str>,
        span: Span,
    },

    #[error("property '{name}' depends on itself but has no default value")]
    SelfDependency { name: Rc<str>, span: Span },

    #[error("dependency loop in agent '{agent}' involving '{member}'")]
    DependencyLoop {
        agent: Rc<str>,
        member: Rc<str>,
        span: Span,
    },
}

impl ResolveError {
    pub fn span(&self) -> Span {
        match self {
            ResolveError::DuplicateDefine { span, .. }
            | ResolveError::DuplicateAgent { span, .. }
            | ResolveError::DuplicateMember { span, .. }
            | ResolveError::SelfDependency { span, .. }
            | ResolveError::DependencyLoop { span, .. } => *span,
        }
    }
}
