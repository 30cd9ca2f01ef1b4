// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Static validation and dependency ordering for Flock programs.
//!
//! Runs after parsing, before evaluation:
//!
//! - name uniqueness (defines, agent types, members within one type),
//! - per-agent-type dependency analysis over member expressions,
//! - self-dependency check (a property may reference itself only through a
//!   default value),
//! - DFS topological sort of each agent type's members, rewriting the member
//!   list into dependency-first order,
//! - defines reordered ahead of agent declarations.
//!
//! The reordering is what makes step-0 initialization consistent: at step 0 a
//! member may read sibling members evaluated earlier in the same pass, so
//! dependencies must come first. From step 1 onward lookups only read the
//! previous step's committed snapshot and the order is observably inert.

mod deps;
mod error;
mod order;

pub use error::ResolveError;

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;

use flock_ast::ast::{Decl, Program};

/// Validate a parsed program and rewrite its declaration lists into
/// dependency-respecting order.
///
/// Only the ordering of `body` lists is mutated; subtrees are left intact.
pub fn resolve(program: &mut Program) -> Result<(), ResolveError> {
    check_unique_names(program)?;

    // Defines ahead of all agent declarations, otherwise stable.
    program
        .body
        .sort_by_key(|decl| matches!(decl, Decl::Agent(_)));

    let type_names: HashSet<Rc<str>> = program
        .body
        .iter()
        .filter_map(|decl| match decl {
            Decl::Agent(agent) => Some(agent.name.clone()),
            Decl::Define(_) => None,
        })
        .collect();

    for decl in &mut program.body {
        if let Decl::Agent(agent) = decl {
            order::sort_members(agent, &type_names)?;
        }
    }

    Ok(())
}

fn check_unique_names(program: &Program) -> Result<(), ResolveError> {
    let mut defines: IndexMap<Rc<str>, ()> = IndexMap::new();
    let mut agents: IndexMap<Rc<str>, ()> = IndexMap::new();

    for decl in &program.body {
        match decl {
            Decl::Define(define) => {
                if defines.insert(define.name.clone(), ()).is_some() {
                    return Err(ResolveError::DuplicateDefine {
                        name: define.name.clone(),
                        span: define.span,
                    });
                }
            }
            Decl::Agent(agent) => {
                if agents.insert(agent.name.clone(), ()).is_some() {
                    return Err(ResolveError::DuplicateAgent {
                        name: agent.name.clone(),
                        span: agent.span,
                    });
                }
                let mut members: IndexMap<Rc<str>, ()> = IndexMap::new();
                for member in &agent.members {
                    if members.insert(member.name.clone(), ()).is_some() {
                        return Err(ResolveError::DuplicateMember {
                            name: member.name.clone(),
                            agent: agent.name.clone(),
                            span: member.span,
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_ast::ast::Decl;

    fn resolved(source: &str) -> Program {
        let tokens = flock_lexer::lex(source).unwrap();
        let mut program = flock_parser::parse_program(&tokens).unwrap();
        resolve(&mut program).unwrap();
        program
    }

    fn resolve_err(source: &str) -> ResolveError {
        let tokens = flock_lexer::lex(source).unwrap();
        let mut program = flock_parser::parse_program(&tokens).unwrap();
        resolve(&mut program).unwrap_err()
    }

    fn member_names(program: &Program, agent: &str) -> Vec<String> {
        program
            .body
            .iter()
            .find_map(|decl| match decl {
                Decl::Agent(a) if &*a.name == agent => {
                    Some(a.members.iter().map(|m| m.name.to_string()).collect())
                }
                _ => None,
            })
            .expect("agent not found")
    }

    #[test]
    fn test_defines_move_ahead_of_agents() {
        let program = resolved("agent a 1 {} define n = 5; agent b 1 {}");
        assert!(matches!(program.body[0], Decl::Define(_)));
        assert!(matches!(program.body[1], Decl::Agent(_)));
        assert!(matches!(program.body[2], Decl::Agent(_)));
    }

    #[test]
    fn test_members_sorted_dependency_first() {
        let program = resolved(
            "agent person 1 {
                property y = x * 2;
                property x: 1 = x;
            }",
        );
        assert_eq!(member_names(&program, "person"), vec!["x", "y"]);
    }

    #[test]
    fn test_chain_of_dependencies() {
        let program = resolved(
            "agent person 1 {
                const c = b + 1;
                const b = a + 1;
                const a = 1;
            }",
        );
        assert_eq!(member_names(&program, "person"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_independent_members_keep_declaration_order() {
        let program = resolved(
            "agent person 1 {
                const a = 1;
                const b = 2;
                const c = 3;
            }",
        );
        assert_eq!(member_names(&program, "person"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_self_reference_with_default_is_allowed() {
        let program = resolved("agent person 1 { property x: 0 = x + 1; }");
        assert_eq!(member_names(&program, "person"), vec!["x"]);
    }

    #[test]
    fn test_self_reference_without_default_is_rejected() {
        let err = resolve_err("agent person 1 { property x = x + 1; }");
        let message = err.to_string();
        assert!(message.contains("depends on itself"), "{}", message);
        assert!(message.contains("no default value"), "{}", message);
    }

    #[test]
    fn test_mutual_reference_is_a_dependency_loop() {
        let err = resolve_err(
            "agent person 1 {
                property a = b;
                property b = a;
            }",
        );
        assert!(err.to_string().contains("dependency loop"), "{}", err);
    }

    #[test]
    fn test_agent_type_name_is_not_a_dependency() {
        // `person` names the agent type, not a sibling member.
        let program = resolved(
            "agent person 2 {
                property n = count(agents(person));
            }",
        );
        assert_eq!(member_names(&program, "person"), vec!["n"]);
    }

    #[test]
    fn test_comprehension_param_is_not_a_dependency() {
        let program = resolved(
            "agent person 2 {
                const p = 1;
                property total = sum(agents(person) => p => p.p);
            }",
        );
        assert_eq!(member_names(&program, "person"), vec!["p", "total"]);
    }

    #[test]
    fn test_duplicate_define() {
        let err = resolve_err("define n = 1; define n = 2;");
        assert!(err.to_string().contains("duplicate define"), "{}", err);
    }

    #[test]
    fn test_duplicate_agent_type() {
        let err = resolve_err("agent a 1 {} agent a 1 {}");
        assert!(err.to_string().contains("duplicate agent"), "{}", err);
    }

    #[test]
    fn test_duplicate_member() {
        let err = resolve_err("agent a 1 { const x = 1; const x = 2; }");
        assert!(err.to_string().contains("duplicate member"), "{}", err);
    }
}
