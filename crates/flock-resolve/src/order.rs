//! Topological ordering of an agent type's members.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;

use flock_ast::ast::AgentDecl;

use crate::deps::member_dependencies;
use crate::error::ResolveError;

/// DFS visit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Grey,
    Black,
}

/// Rewrite `agent.members` into dependency-first order.
///
/// Edges run from a member to each sibling its step-0 expression references.
/// A self-edge is the sanctioned default-based recurrence and is skipped by
/// the cycle check, but a property whose dependency set contains itself
/// without a default is rejected first. Any other revisit of a grey node is
/// a dependency loop and fails the whole program.
pub(crate) fn sort_members(
    agent: &mut AgentDecl,
    type_names: &HashSet<Rc<str>>,
) -> Result<(), ResolveError> {
    let index_of: IndexMap<Rc<str>, usize> = agent
        .members
        .iter()
        .enumerate()
        .map(|(i, m)| (m.name.clone(), i))
        .collect();

    // Dependency edges restricted to sibling members, self-edges excluded.
    let mut edges: Vec<Vec<usize>> = Vec::with_capacity(agent.members.len());
    for member in &agent.members {
        let deps = member_dependencies(member, type_names);

        if deps.contains(&member.name) && member.default.is_none() {
            return Err(ResolveError::SelfDependency {
                name: member.name.clone(),
                span: member.span,
            });
        }

        let mut member_edges: Vec<usize> = deps
            .iter()
            .filter(|dep| **dep != member.name)
            .filter_map(|dep| index_of.get(dep).copied())
            .collect();
        // Deterministic visit order regardless of hash iteration.
        member_edges.sort_unstable();
        edges.push(member_edges);
    }

    let mut sorter = Sorter {
        edges: &edges,
        marks: vec![Mark::White; agent.members.len()],
        order: Vec::with_capacity(agent.members.len()),
    };
    for index in 0..agent.members.len() {
        sorter.visit(index).map_err(|cycle_at| {
            let member = &agent.members[cycle_at];
            ResolveError::DependencyLoop {
                agent: agent.name.clone(),
                member: member.name.clone(),
                span: member.span,
            }
        })?;
    }

    // Rewrite the member list in sorted order. Indices in `order` are unique,
    // so taking each member once is safe.
    let mut slots: Vec<Option<flock_ast::ast::MemberDecl>> =
        agent.members.drain(..).map(Some).collect();
    agent.members = sorter
        .order
        .iter()
        .filter_map(|&i| slots[i].take())
        .collect();

    Ok(())
}

struct Sorter<'a> {
    edges: &'a [Vec<usize>],
    marks: Vec<Mark>,
    order: Vec<usize>,
}

impl Sorter<'_> {
    /// Visit dependencies first, then emit the node. Returns the index where
    /// a cycle was detected.
    fn visit(&mut self, index: usize) -> Result<(), usize> {
        match self.marks[index] {
            Mark::Black => return Ok(()),
            Mark::Grey => return Err(index),
            Mark::White => {}
        }

        self.marks[index] = Mark::Grey;
        for &dep in &self.edges[index] {
            self.visit(dep)?;
        }
        self.marks[index] = Mark::Black;
        self.order.push(index);
        Ok(())
    }
}
