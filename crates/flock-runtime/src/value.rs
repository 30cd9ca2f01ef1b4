//! Runtime value types.

use std::rc::Rc;

use crate::builtins::Builtin;

/// Runtime value.
///
/// Only `Number` and `Bool` escape into the external output; the remaining
/// kinds are evaluator-internal. `Null` arises exclusively from
/// suppressed-fault evaluation of an `otherwise` left operand (and from the
/// builtins documented to return it), never from source literals.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
    /// An agent-type name as a first-class token, consumed by `agents()`.
    TypeName(Rc<str>),
    /// A native function from the builtin library.
    Function(Builtin),
    Null,
    /// A single agent reference, by id.
    Agent(Rc<str>),
    /// A list of agent references, by id.
    AgentList(Vec<Rc<str>>),
    /// Paired per-agent results of a set comprehension, consumed by the
    /// aggregate builtins.
    Comprehension(Rc<ComprehensionValue>),
}

/// Result of evaluating `base => param => body`: the agents that were
/// mapped over (the evaluating agent excluded) and the body's value for
/// each, index-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct ComprehensionValue {
    pub agents: Vec<Rc<str>>,
    pub results: Vec<Value>,
}

impl Value {
    /// Kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::TypeName(_) => "agent type",
            Value::Function(_) => "function",
            Value::Null => "null",
            Value::Agent(_) => "agent",
            Value::AgentList(_) => "agent list",
            Value::Comprehension(_) => "comprehension",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}
