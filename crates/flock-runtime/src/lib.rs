// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Step evaluator for Flock simulations.
//!
//! The [`Evaluator`] owns the static, resolved program plus the state carried
//! across steps: the root environment (builtins, agent-type tokens and, after
//! step 0, the defines), the previous step's committed population snapshot,
//! and the random number generator. `run(step)` evaluates the whole
//! population once and returns the external [`Output`] record for that step.
//!
//! One step is single-threaded and fully synchronous; a fresh evaluator
//! shares no state with any other.

mod builtins;
mod env;
mod error;
mod eval;
mod output;
mod population;
mod value;

pub use builtins::Builtin;
pub use env::Environment;
pub use error::{RuntimeError, RuntimeErrorKind};
pub use eval::Evaluator;
pub use output::{Output, OutputAgent, OutputValue};
pub use population::{Population, RuntimeAgent};
pub use value::{ComprehensionValue, Value};
