//! Agent population storage.
//!
//! The population under construction is an explicit [`PopulationBuilder`]
//! keyed by agent id, committed into an immutable [`Population`] at the end
//! of the step. Which of the two a lookup reads from is decided by the step
//! number through [`PopulationView`]: at step 0 the "previous population" is
//! the list being filled in order, so lookups go to the builder; from step 1
//! onward they go to the committed snapshot only.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::Value;

/// One concrete agent instance.
///
/// Rebuilt fresh every step; the id is `"<type>-<index>"` with a zero-based
/// index. The variables map is filled incrementally in dependency order.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeAgent {
    pub id: Rc<str>,
    pub type_name: Rc<str>,
    pub variables: IndexMap<Rc<str>, Value>,
}

impl RuntimeAgent {
    pub fn new(id: Rc<str>, type_name: Rc<str>) -> Self {
        Self {
            id,
            type_name,
            variables: IndexMap::new(),
        }
    }
}

/// The committed population snapshot of one step.
#[derive(Debug, Clone, Default)]
pub struct Population {
    agents: IndexMap<Rc<str>, RuntimeAgent>,
}

impl Population {
    pub fn get(&self, id: &str) -> Option<&RuntimeAgent> {
        self.agents.get(id)
    }

    /// Agents in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &RuntimeAgent> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    fn ids_of_type(&self, type_name: &str, exclude: &str) -> Vec<Rc<str>> {
        self.agents
            .values()
            .filter(|a| &*a.type_name == type_name && &*a.id != exclude)
            .map(|a| a.id.clone())
            .collect()
    }
}

/// The population being built for the current step.
#[derive(Debug, Default)]
pub struct PopulationBuilder {
    agents: IndexMap<Rc<str>, RuntimeAgent>,
}

impl PopulationBuilder {
    /// Register an instance. Happens before any of its variables are filled,
    /// so in-step lookups can observe the partially built agent.
    pub fn register(&mut self, agent: RuntimeAgent) {
        self.agents.insert(agent.id.clone(), agent);
    }

    /// Fill one variable of a registered agent.
    pub fn set(&mut self, id: &str, name: Rc<str>, value: Value) {
        if let Some(agent) = self.agents.get_mut(id) {
            agent.variables.insert(name, value);
        }
    }

    pub fn get(&self, id: &str) -> Option<&RuntimeAgent> {
        self.agents.get(id)
    }

    fn ids_of_type(&self, type_name: &str, exclude: &str) -> Vec<Rc<str>> {
        self.agents
            .values()
            .filter(|a| &*a.type_name == type_name && &*a.id != exclude)
            .map(|a| a.id.clone())
            .collect()
    }

    /// Seal the step's population.
    pub fn commit(self) -> Population {
        Population {
            agents: self.agents,
        }
    }
}

/// Read access to agent state during one step, with the read source made
/// explicit instead of relying on shared-list aliasing.
#[derive(Clone, Copy)]
pub(crate) struct PopulationView<'a> {
    step: u64,
    previous: &'a Population,
    builder: &'a PopulationBuilder,
}

impl<'a> PopulationView<'a> {
    pub fn new(step: u64, previous: &'a Population, builder: &'a PopulationBuilder) -> Self {
        Self {
            step,
            previous,
            builder,
        }
    }

    fn agent(&self, id: &str) -> Option<&'a RuntimeAgent> {
        if self.step == 0 {
            self.builder.get(id)
        } else {
            self.previous.get(id)
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agent(id).is_some()
    }

    /// Read a named variable of an agent from the step's read source.
    pub fn agent_var(&self, id: &str, name: &str) -> Option<&'a Value> {
        self.agent(id).and_then(|a| a.variables.get(name))
    }

    /// Ids of all agents of a type, excluding the evaluating agent.
    pub fn ids_of_type(&self, type_name: &str, exclude: &str) -> Vec<Rc<str>> {
        if self.step == 0 {
            self.builder.ids_of_type(type_name, exclude)
        } else {
            self.previous.ids_of_type(type_name, exclude)
        }
    }
}
