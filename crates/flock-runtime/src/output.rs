//! External output records.
//!
//! The structural dump of one step. Only scalar values escape: variables
//! holding agent references, functions, nulls or comprehension results stay
//! evaluator-internal and are omitted here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::population::Population;
use crate::value::Value;

/// Result of one step evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub step: u64,
    pub agents: Vec<OutputAgent>,
}

/// One agent instance in the dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputAgent {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub variables: IndexMap<String, OutputValue>,
}

/// A scalar variable value, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum OutputValue {
    Number(f64),
    Boolean(bool),
}

/// Snapshot a committed population into the external record. No references
/// are shared with the evaluator's mutable state.
pub(crate) fn snapshot(step: u64, population: &Population) -> Output {
    let agents = population
        .iter()
        .map(|agent| OutputAgent {
            id: agent.id.to_string(),
            type_name: agent.type_name.to_string(),
            variables: agent
                .variables
                .iter()
                .filter_map(|(name, value)| {
                    let value = match value {
                        Value::Number(n) => OutputValue::Number(*n),
                        Value::Bool(b) => OutputValue::Boolean(*b),
                        _ => return None,
                    };
                    Some((name.to_string(), value))
                })
                .collect(),
        })
        .collect();

    Output { step, agents }
}
