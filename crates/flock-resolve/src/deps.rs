//! Dependency extraction from member expressions.

use std::collections::HashSet;
use std::rc::Rc;

use flock_ast::ast::{Expr, ExprKind, MemberDecl};

/// Compute the dependency set of a member: every identifier leaf referenced
/// by its step-0 expression (the default when present, the value expression
/// otherwise), except
///
/// - identifiers naming an agent type (first-class type tokens, not data),
/// - identifiers bound by an enclosing comprehension parameter (the bound
///   agent is opaque; its member accesses are not dependencies of the
///   caller's siblings).
///
/// Builtin and define names survive into the set; callers intersect it with
/// the sibling member names, so they never become edges.
pub(crate) fn member_dependencies(
    member: &MemberDecl,
    type_names: &HashSet<Rc<str>>,
) -> HashSet<Rc<str>> {
    let expr = member.default.as_ref().unwrap_or(&member.value);
    let mut deps = HashSet::new();
    let mut bound = Vec::new();
    collect(expr, type_names, &mut bound, &mut deps);
    deps
}

fn collect(
    expr: &Expr,
    type_names: &HashSet<Rc<str>>,
    bound: &mut Vec<Rc<str>>,
    deps: &mut HashSet<Rc<str>>,
) {
    match &expr.kind {
        ExprKind::Number(_) | ExprKind::Bool(_) => {}
        ExprKind::Ident(name) => {
            if !bound.iter().any(|b| b == name) && !type_names.contains(name) {
                deps.insert(name.clone());
            }
        }
        ExprKind::Binary { left, right, .. }
        | ExprKind::Logical { left, right, .. }
        | ExprKind::Otherwise { left, right } => {
            collect(left, type_names, bound, deps);
            collect(right, type_names, bound, deps);
        }
        ExprKind::Unary { operand, .. } => collect(operand, type_names, bound, deps),
        ExprKind::Conditional {
            condition,
            consequent,
            alternate,
        } => {
            collect(condition, type_names, bound, deps);
            collect(consequent, type_names, bound, deps);
            collect(alternate, type_names, bound, deps);
        }
        ExprKind::Call { callee, args } => {
            collect(callee, type_names, bound, deps);
            for arg in args {
                collect(arg, type_names, bound, deps);
            }
        }
        // The member name itself is not an identifier reference; only the
        // object expression can carry dependencies.
        ExprKind::Member { object, .. } => collect(object, type_names, bound, deps),
        ExprKind::Comprehension { base, param, body } => {
            collect(base, type_names, bound, deps);
            bound.push(param.clone());
            collect(body, type_names, bound, deps);
            bound.pop();
        }
    }
}
