//! The builtin function library.
//!
//! Pure functions over argument lists, each validating arity and argument
//! kinds before computing. `step()`, `index()` and `agents()` read the
//! evaluation context instead of being rebound per iteration; the aggregate
//! builtins (`sum`, `min`, `max`, `filter`) consume comprehension values.

use std::fmt;
use std::rc::Rc;

use rand::Rng;

use crate::env::Environment;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::eval::EvalContext;
use crate::value::{ComprehensionValue, Value};

pub(crate) type NativeFn = fn(&mut EvalContext<'_>, &[Value]) -> Result<Value, RuntimeError>;

/// A native function value.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub(crate) call: NativeFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<builtin {}>", self.name)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// The fixed library, bound into the root environment at construction.
const TABLE: &[(&str, NativeFn)] = &[
    ("sqrt", sqrt),
    ("abs", abs),
    ("floor", floor),
    ("ceil", ceil),
    ("round", round),
    ("sin", sin),
    ("cos", cos),
    ("tan", tan),
    ("atan", atan),
    ("random", random),
    ("choice", choice),
    ("prob", prob),
    ("dist", dist),
    ("empty", empty),
    ("count", count),
    ("find_by_coordinates", find_by_coordinates),
    ("sum", sum),
    ("min", min),
    ("max", max),
    ("filter", filter),
    ("step", step),
    ("index", index),
    ("agents", agents),
];

/// Bind every builtin into `env`.
pub(crate) fn install(env: &mut Environment) -> Result<(), RuntimeError> {
    for &(name, call) in TABLE {
        env.declare(Rc::from(name), Value::Function(Builtin { name, call }))?;
    }
    Ok(())
}

// === Validation helpers ===

fn expect_arity(name: &'static str, args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeErrorKind::WrongArity {
            name,
            expected,
            found: args.len(),
        }
        .into());
    }
    Ok(())
}

fn number_arg(name: &'static str, args: &[Value], index: usize) -> Result<f64, RuntimeError> {
    match &args[index] {
        Value::Number(n) => Ok(*n),
        other => Err(RuntimeErrorKind::InvalidArgument {
            name,
            message: format!(
                "argument {} must be a number, found {}",
                index + 1,
                other.kind_name()
            ),
        }
        .into()),
    }
}

fn agent_list_arg<'v>(
    name: &'static str,
    args: &'v [Value],
    index: usize,
) -> Result<&'v [Rc<str>], RuntimeError> {
    match &args[index] {
        Value::AgentList(ids) => Ok(ids),
        other => Err(RuntimeErrorKind::InvalidArgument {
            name,
            message: format!(
                "argument {} must be an agent list, found {}",
                index + 1,
                other.kind_name()
            ),
        }
        .into()),
    }
}

/// Validate the shared comprehension contract: one argument, agent count
/// equal to result count.
fn comprehension_arg<'v>(
    name: &'static str,
    args: &'v [Value],
) -> Result<&'v ComprehensionValue, RuntimeError> {
    expect_arity(name, args, 1)?;
    let comprehension = match &args[0] {
        Value::Comprehension(c) => c,
        other => {
            return Err(RuntimeErrorKind::InvalidArgument {
                name,
                message: format!("expects a set comprehension, found {}", other.kind_name()),
            }
            .into());
        }
    };
    if comprehension.agents.len() != comprehension.results.len() {
        return Err(RuntimeErrorKind::ComprehensionMismatch {
            agents: comprehension.agents.len(),
            results: comprehension.results.len(),
        }
        .into());
    }
    Ok(comprehension)
}

fn numeric_results<'v>(
    name: &'static str,
    comprehension: &'v ComprehensionValue,
) -> Result<Vec<f64>, RuntimeError> {
    comprehension
        .results
        .iter()
        .map(|result| {
            result.as_number().ok_or_else(|| {
                RuntimeError::from(RuntimeErrorKind::InvalidArgument {
                    name,
                    message: format!(
                        "comprehension results must be numbers, found {}",
                        result.kind_name()
                    ),
                })
            })
        })
        .collect()
}

// === Arithmetic & trigonometry ===

fn unary_math(
    name: &'static str,
    args: &[Value],
    f: fn(f64) -> f64,
) -> Result<Value, RuntimeError> {
    expect_arity(name, args, 1)?;
    Ok(Value::Number(f(number_arg(name, args, 0)?)))
}

fn sqrt(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    unary_math("sqrt", args, f64::sqrt)
}

fn abs(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    unary_math("abs", args, f64::abs)
}

fn floor(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    unary_math("floor", args, f64::floor)
}

fn ceil(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    unary_math("ceil", args, f64::ceil)
}

fn round(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    unary_math("round", args, f64::round)
}

fn sin(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    unary_math("sin", args, f64::sin)
}

fn cos(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    unary_math("cos", args, f64::cos)
}

fn tan(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    unary_math("tan", args, f64::tan)
}

fn atan(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    unary_math("atan", args, f64::atan)
}

// === Randomness ===

/// `random(min, max)`: uniform float in `[min, max)`.
fn random(ctx: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    expect_arity("random", args, 2)?;
    let min = number_arg("random", args, 0)?;
    let max = number_arg("random", args, 1)?;
    if min > max {
        return Err(RuntimeErrorKind::InvalidArgument {
            name: "random",
            message: format!("requires min <= max, got {} and {}", min, max),
        }
        .into());
    }
    if min == max {
        return Ok(Value::Number(min));
    }
    Ok(Value::Number(ctx.rng.gen_range(min..max)))
}

/// `choice(a, b)`: 50/50 between two same-kinded values.
fn choice(ctx: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    expect_arity("choice", args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Number(_), Value::Number(_)) | (Value::Bool(_), Value::Bool(_)) => {
            let first = ctx.rng.gen_bool(0.5);
            Ok(args[if first { 0 } else { 1 }].clone())
        }
        (a, b) => Err(RuntimeErrorKind::InvalidArgument {
            name: "choice",
            message: format!(
                "requires two numbers or two booleans, found {} and {}",
                a.kind_name(),
                b.kind_name()
            ),
        }
        .into()),
    }
}

/// `prob(p)`: true with probability `p`.
fn prob(ctx: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    expect_arity("prob", args, 1)?;
    let p = number_arg("prob", args, 0)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(RuntimeErrorKind::InvalidArgument {
            name: "prob",
            message: format!("probability must be between 0 and 1, got {}", p),
        }
        .into());
    }
    Ok(Value::Bool(ctx.rng.gen_bool(p)))
}

// === Geometry ===

fn dist(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    expect_arity("dist", args, 4)?;
    let x1 = number_arg("dist", args, 0)?;
    let y1 = number_arg("dist", args, 1)?;
    let x2 = number_arg("dist", args, 2)?;
    let y2 = number_arg("dist", args, 3)?;
    Ok(Value::Number((x2 - x1).hypot(y2 - y1)))
}

// === Population queries ===

fn empty(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    expect_arity("empty", args, 0)?;
    Ok(Value::AgentList(Vec::new()))
}

fn count(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    expect_arity("count", args, 1)?;
    let ids = agent_list_arg("count", args, 0)?;
    Ok(Value::Number(ids.len() as f64))
}

/// Linear scan for the first agent whose `x`/`y` properties match; `Null`
/// when nothing matches (pairs with `otherwise`).
fn find_by_coordinates(ctx: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    expect_arity("find_by_coordinates", args, 3)?;
    let ids = agent_list_arg("find_by_coordinates", args, 0)?;
    let x = number_arg("find_by_coordinates", args, 1)?;
    let y = number_arg("find_by_coordinates", args, 2)?;

    for id in ids {
        let ax = coordinate(ctx, id, "x")?;
        let ay = coordinate(ctx, id, "y")?;
        if ax == x && ay == y {
            return Ok(Value::Agent(id.clone()));
        }
    }
    Ok(Value::Null)
}

fn coordinate(ctx: &EvalContext<'_>, id: &Rc<str>, var: &str) -> Result<f64, RuntimeError> {
    match ctx.view.agent_var(id, var) {
        Some(Value::Number(n)) => Ok(*n),
        Some(other) => Err(RuntimeErrorKind::InvalidArgument {
            name: "find_by_coordinates",
            message: format!(
                "property '{}' of agent '{}' is not a number, found {}",
                var,
                id,
                other.kind_name()
            ),
        }
        .into()),
        None => Err(RuntimeErrorKind::MissingProperty {
            id: id.clone(),
            name: Rc::from(var),
        }
        .into()),
    }
}

// === Comprehension aggregators ===

fn sum(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let comprehension = comprehension_arg("sum", args)?;
    let results = numeric_results("sum", comprehension)?;
    Ok(Value::Number(results.iter().sum()))
}

fn min(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let comprehension = comprehension_arg("min", args)?;
    let results = numeric_results("min", comprehension)?;
    Ok(results
        .into_iter()
        .reduce(f64::min)
        .map_or(Value::Null, Value::Number))
}

fn max(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let comprehension = comprehension_arg("max", args)?;
    let results = numeric_results("max", comprehension)?;
    Ok(results
        .into_iter()
        .reduce(f64::max)
        .map_or(Value::Null, Value::Number))
}

fn filter(_: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    let comprehension = comprehension_arg("filter", args)?;
    let mut kept = Vec::new();
    for (id, result) in comprehension.agents.iter().zip(&comprehension.results) {
        match result {
            Value::Bool(true) => kept.push(id.clone()),
            Value::Bool(false) => {}
            other => {
                return Err(RuntimeErrorKind::InvalidArgument {
                    name: "filter",
                    message: format!(
                        "comprehension results must be booleans, found {}",
                        other.kind_name()
                    ),
                }
                .into());
            }
        }
    }
    Ok(Value::AgentList(kept))
}

// === Context readers ===

fn step(ctx: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    expect_arity("step", args, 0)?;
    Ok(Value::Number(ctx.step as f64))
}

fn index(ctx: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    expect_arity("index", args, 0)?;
    Ok(Value::Number(ctx.agent_index as f64))
}

/// `agents(type)`: the population of a type from the step's read source,
/// excluding the evaluating agent.
fn agents(ctx: &mut EvalContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    expect_arity("agents", args, 1)?;
    match &args[0] {
        Value::TypeName(type_name) => Ok(Value::AgentList(
            ctx.view.ids_of_type(type_name, &ctx.self_id),
        )),
        other => Err(RuntimeErrorKind::InvalidArgument {
            name: "agents",
            message: format!("expects an agent type name, found {}", other.kind_name()),
        }
        .into()),
    }
}
