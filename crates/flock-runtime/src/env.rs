//! Root environment: defines, agent-type tokens and builtin functions.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::value::Value;

/// Name-to-value bindings for the root scope.
///
/// Redeclaring a name is an error, as is a lookup miss at the call sites
/// (callers turn `None` into `Undefined`). Comprehension-local bindings are
/// not kept here; they live on the evaluation context's binding stack.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: IndexMap<Rc<str>, Value>,
}

impl Environment {
    /// Bind a new name. Fails if the name is already bound in this scope.
    pub fn declare(&mut self, name: Rc<str>, value: Value) -> Result<(), RuntimeError> {
        if self.vars.contains_key(&name) {
            return Err(RuntimeErrorKind::AlreadyDeclared(name).into());
        }
        self.vars.insert(name, value);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_lookup() {
        let mut env = Environment::default();
        env.declare(Rc::from("n"), Value::Number(3.0)).unwrap();
        assert_eq!(env.lookup("n"), Some(&Value::Number(3.0)));
        assert_eq!(env.lookup("missing"), None);
    }

    #[test]
    fn test_redeclaration_is_an_error() {
        let mut env = Environment::default();
        env.declare(Rc::from("n"), Value::Number(3.0)).unwrap();
        let err = env.declare(Rc::from("n"), Value::Number(4.0)).unwrap_err();
        assert!(err.to_string().contains("already declared"), "{}", err);
    }
}
