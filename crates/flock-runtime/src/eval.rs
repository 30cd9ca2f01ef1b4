//! The step evaluator.
//!
//! `run(step)` evaluates the whole population once:
//!
//! 1. at step 0 only, defines are bound into the root environment (their
//!    expressions must be number or boolean literals),
//! 2. each agent type's count is evaluated and that many instances are
//!    created; every instance is registered in the builder before its
//!    variables are filled,
//! 3. each instance's members are evaluated in the dependency-sorted order
//!    established by the resolver: a const evaluates its value expression at
//!    step 0 and is copied forward afterwards, a property evaluates its
//!    default (if any) at step 0 and its value expression on every later
//!    step,
//! 4. identifiers resolve innermost-first: comprehension bindings, then the
//!    root environment, then the evaluating agent's variables from the
//!    step's read source (the builder at step 0, the committed previous
//!    snapshot afterwards),
//! 5. the built population is committed as the next step's previous
//!    snapshot and a scalar-only output record is produced.

use std::rc::Rc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use flock_ast::ast::{
    AgentDecl, BinaryOp, Decl, Expr, ExprKind, LogicalOp, MemberKind, Program, UnaryOp,
};
use flock_ast::span::Span;

use crate::builtins;
use crate::env::Environment;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::output::{self, Output};
use crate::population::{Population, PopulationBuilder, PopulationView, RuntimeAgent};
use crate::value::{ComprehensionValue, Value};

/// Everything an expression evaluation can reach, threaded explicitly.
pub(crate) struct EvalContext<'a> {
    pub root: &'a Environment,
    pub step: u64,
    /// Zero-based position of the instance being built within its type's
    /// instantiation loop.
    pub agent_index: usize,
    pub self_id: Rc<str>,
    pub view: PopulationView<'a>,
    pub rng: &'a mut SmallRng,
    /// Active comprehension bindings, innermost last.
    pub bindings: Vec<(Rc<str>, Value)>,
}

/// Owns the static program and the state carried across steps.
pub struct Evaluator {
    program: Program,
    root: Environment,
    previous: Population,
    rng: SmallRng,
}

impl Evaluator {
    /// Create an evaluator with an entropy-seeded random number generator.
    pub fn new(program: Program) -> Self {
        Self {
            program,
            root: Environment::default(),
            previous: Population::default(),
            rng: SmallRng::from_entropy(),
        }
    }

    /// Create an evaluator with a fixed seed, for reproducible runs.
    pub fn with_seed(program: Program, seed: u64) -> Self {
        Self {
            program,
            root: Environment::default(),
            previous: Population::default(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Evaluate one simulation step.
    ///
    /// The caller drives the step numbers starting at 0; a fresh sequence
    /// (step 0) resets the population and rebinds defines. On error the
    /// evaluator's state is undefined and the instance should be discarded.
    pub fn run(&mut self, step: u64) -> Result<Output, RuntimeError> {
        debug!(step, "step starting");

        if step == 0 {
            self.previous = Population::default();
            self.root = build_root_env(&self.program)?;
        }

        let mut builder = PopulationBuilder::default();

        for decl in &self.program.body {
            let Decl::Agent(agent) = decl else { continue };
            let count = eval_count(&self.root, agent)?;
            trace!(agent = %agent.name, count, "instantiating");

            for agent_index in 0..count {
                let id: Rc<str> = Rc::from(format!("{}-{}", agent.name, agent_index));
                builder.register(RuntimeAgent::new(id.clone(), agent.name.clone()));

                for member in &agent.members {
                    let value = if member.kind == MemberKind::Const && step > 0 {
                        // Carried forward by value, never recomputed.
                        self.previous
                            .get(&id)
                            .and_then(|a| a.variables.get(&member.name))
                            .cloned()
                            .ok_or_else(|| {
                                RuntimeError::new(RuntimeErrorKind::MissingProperty {
                                    id: id.clone(),
                                    name: member.name.clone(),
                                })
                                .at(member.span)
                            })?
                    } else {
                        let expr = match (member.kind, step) {
                            (MemberKind::Property, 0) => {
                                member.default.as_ref().unwrap_or(&member.value)
                            }
                            _ => &member.value,
                        };
                        let mut ctx = EvalContext {
                            root: &self.root,
                            step,
                            agent_index: agent_index as usize,
                            self_id: id.clone(),
                            view: PopulationView::new(step, &self.previous, &builder),
                            rng: &mut self.rng,
                            bindings: Vec::new(),
                        };
                        eval_expr(&mut ctx, expr)?
                    };
                    builder.set(&id, member.name.clone(), value);
                }
            }
        }

        let population = builder.commit();
        let output = output::snapshot(step, &population);
        self.previous = population;

        debug!(step, agents = self.previous.len(), "step complete");
        Ok(output)
    }

    /// Clear accumulated population state back to step-0 starting conditions
    /// without re-parsing.
    pub fn reset(&mut self) {
        self.previous = Population::default();
        self.root = Environment::default();
    }
}

/// Builtins, agent-type tokens and defines.
///
/// Defines must be number or boolean literals; the parser accepts a full
/// expression so the error here can point at the offending value.
fn build_root_env(program: &Program) -> Result<Environment, RuntimeError> {
    let mut env = Environment::default();
    builtins::install(&mut env)?;

    for decl in &program.body {
        match decl {
            Decl::Agent(agent) => {
                env.declare(agent.name.clone(), Value::TypeName(agent.name.clone()))?;
            }
            Decl::Define(define) => {
                let value = match &define.value.kind {
                    ExprKind::Number(n) => Value::Number(*n),
                    ExprKind::Bool(b) => Value::Bool(*b),
                    _ => {
                        return Err(RuntimeError::new(RuntimeErrorKind::DefineNotLiteral {
                            name: define.name.clone(),
                        })
                        .at(define.value.span));
                    }
                };
                env.declare(define.name.clone(), value)?;
            }
        }
    }

    Ok(env)
}

/// A count is a number literal or an identifier resolved against the root
/// environment, and must be a non-negative whole number.
fn eval_count(root: &Environment, agent: &AgentDecl) -> Result<u64, RuntimeError> {
    let span = agent.count.span;
    let n = match &agent.count.kind {
        ExprKind::Number(n) => *n,
        ExprKind::Ident(name) => match root.lookup(name) {
            Some(Value::Number(n)) => *n,
            Some(other) => {
                return Err(RuntimeError::new(RuntimeErrorKind::InvalidCount {
                    agent: agent.name.clone(),
                    message: format!(
                        "references '{}' which is not a number, found {}",
                        name,
                        other.kind_name()
                    ),
                })
                .at(span));
            }
            None => {
                return Err(
                    RuntimeError::new(RuntimeErrorKind::Undefined(name.clone())).at(span)
                );
            }
        },
        _ => {
            return Err(RuntimeError::new(RuntimeErrorKind::InvalidCount {
                agent: agent.name.clone(),
                message: "must be a number literal or a define name".to_string(),
            })
            .at(span));
        }
    };

    if !n.is_finite() || n < 0.0 || n.fract() != 0.0 {
        return Err(RuntimeError::new(RuntimeErrorKind::InvalidCount {
            agent: agent.name.clone(),
            message: format!("must be a non-negative whole number, got {}", n),
        })
        .at(span));
    }
    Ok(n as u64)
}

/// Evaluate one expression.
pub(crate) fn eval_expr(ctx: &mut EvalContext<'_>, expr: &Expr) -> Result<Value, RuntimeError> {
    match &expr.kind {
        ExprKind::Number(n) => Ok(Value::Number(*n)),
        ExprKind::Bool(b) => Ok(Value::Bool(*b)),
        ExprKind::Ident(name) => resolve_ident(ctx, name, expr.span),

        ExprKind::Binary { op, left, right } => {
            let l = eval_expr(ctx, left)?;
            let r = eval_expr(ctx, right)?;
            eval_binary(*op, &l, &r).map_err(|e| e.at(expr.span))
        }

        ExprKind::Logical { op, left, right } => {
            let l = eval_expr(ctx, left)?;
            let r = eval_expr(ctx, right)?;
            match (l.as_bool(), r.as_bool()) {
                (Some(a), Some(b)) => Ok(Value::Bool(match op {
                    LogicalOp::And => a && b,
                    LogicalOp::Or => a || b,
                })),
                _ => Err(RuntimeError::new(RuntimeErrorKind::InvalidOperands {
                    op: op.to_string(),
                    expected: "boolean operands",
                    found: format!("{} and {}", l.kind_name(), r.kind_name()),
                })
                .at(expr.span)),
            }
        }

        ExprKind::Unary { op, operand } => {
            let v = eval_expr(ctx, operand)?;
            match (op, &v) {
                (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
                (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                _ => Err(RuntimeError::new(RuntimeErrorKind::InvalidOperands {
                    op: op.to_string(),
                    expected: match op {
                        UnaryOp::Neg => "a numeric operand",
                        UnaryOp::Not => "a boolean operand",
                    },
                    found: v.kind_name().to_string(),
                })
                .at(expr.span)),
            }
        }

        ExprKind::Conditional {
            condition,
            consequent,
            alternate,
        } => {
            let cond = eval_expr(ctx, condition)?;
            match cond.as_bool() {
                // Only the taken branch is evaluated.
                Some(true) => eval_expr(ctx, consequent),
                Some(false) => eval_expr(ctx, alternate),
                None => Err(RuntimeError::new(RuntimeErrorKind::ConditionNotBoolean {
                    found: cond.kind_name(),
                })
                .at(condition.span)),
            }
        }

        ExprKind::Call { callee, args } => {
            let ExprKind::Ident(name) = &callee.kind else {
                return Err(
                    RuntimeError::new(RuntimeErrorKind::CalleeNotIdentifier).at(callee.span)
                );
            };
            let builtin = match resolve_ident(ctx, name, callee.span)? {
                Value::Function(builtin) => builtin,
                other => {
                    return Err(RuntimeError::new(RuntimeErrorKind::NotAFunction {
                        name: name.clone(),
                        found: other.kind_name(),
                    })
                    .at(callee.span));
                }
            };
            let mut argv = Vec::with_capacity(args.len());
            for arg in args {
                argv.push(eval_expr(ctx, arg)?);
            }
            (builtin.call)(ctx, &argv).map_err(|e| e.at(expr.span))
        }

        ExprKind::Member { object, member } => {
            let id = match eval_expr(ctx, object)? {
                Value::Agent(id) => id,
                other => {
                    return Err(RuntimeError::new(RuntimeErrorKind::NotAnAgent {
                        found: other.kind_name(),
                    })
                    .at(object.span));
                }
            };
            match ctx.view.agent_var(&id, member) {
                Some(v) => Ok(v.clone()),
                None if ctx.view.contains(&id) => {
                    Err(RuntimeError::new(RuntimeErrorKind::MissingProperty {
                        id,
                        name: member.clone(),
                    })
                    .at(expr.span))
                }
                None => Err(RuntimeError::new(RuntimeErrorKind::MissingAgent { id }).at(expr.span)),
            }
        }

        ExprKind::Comprehension { base, param, body } => {
            let ids = match eval_expr(ctx, base)? {
                Value::AgentList(ids) => ids,
                other => {
                    return Err(RuntimeError::new(RuntimeErrorKind::ComprehensionBase {
                        found: other.kind_name(),
                    })
                    .at(base.span));
                }
            };

            let mut agents = Vec::with_capacity(ids.len());
            let mut results = Vec::with_capacity(ids.len());
            for id in ids {
                if id == ctx.self_id {
                    continue;
                }
                ctx.bindings.push((param.clone(), Value::Agent(id.clone())));
                let result = eval_expr(ctx, body);
                ctx.bindings.pop();
                agents.push(id);
                results.push(result?);
            }
            Ok(Value::Comprehension(Rc::new(ComprehensionValue {
                agents,
                results,
            })))
        }

        // The only recoverable-failure construct: a fault raised while
        // evaluating the left operand is suppressed to Null, and Null takes
        // the right side.
        ExprKind::Otherwise { left, right } => match eval_expr(ctx, left) {
            Ok(Value::Null) | Err(_) => eval_expr(ctx, right),
            Ok(value) => Ok(value),
        },
    }
}

/// Innermost-first identifier resolution: comprehension bindings, the root
/// environment, then the evaluating agent's variables from the step's read
/// source.
fn resolve_ident(
    ctx: &EvalContext<'_>,
    name: &Rc<str>,
    span: Span,
) -> Result<Value, RuntimeError> {
    for (bound, value) in ctx.bindings.iter().rev() {
        if bound == name {
            return Ok(value.clone());
        }
    }
    if let Some(value) = ctx.root.lookup(name) {
        return Ok(value.clone());
    }
    if let Some(value) = ctx.view.agent_var(&ctx.self_id, name) {
        return Ok(value.clone());
    }
    Err(RuntimeError::new(RuntimeErrorKind::Undefined(name.clone())).at(span))
}

fn eval_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
        return match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(match op {
                BinaryOp::Eq => a == b,
                _ => a != b,
            })),
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
                BinaryOp::Eq => a == b,
                _ => a != b,
            })),
            _ => Err(RuntimeError::new(RuntimeErrorKind::InvalidOperands {
                op: op.to_string(),
                expected: "two numbers or two booleans",
                found: format!("{} and {}", left.kind_name(), right.kind_name()),
            })),
        };
    }

    let (Value::Number(a), Value::Number(b)) = (left, right) else {
        return Err(RuntimeError::new(RuntimeErrorKind::InvalidOperands {
            op: op.to_string(),
            expected: "numeric operands",
            found: format!("{} and {}", left.kind_name(), right.kind_name()),
        }));
    };
    let (a, b) = (*a, *b);

    match op {
        BinaryOp::Add => Ok(Value::Number(a + b)),
        BinaryOp::Sub => Ok(Value::Number(a - b)),
        BinaryOp::Mul => Ok(Value::Number(a * b)),
        BinaryOp::Div => {
            if b == 0.0 {
                Err(RuntimeError::new(RuntimeErrorKind::DivisionByZero))
            } else {
                Ok(Value::Number(a / b))
            }
        }
        // True modulo: non-negative for a positive modulus.
        BinaryOp::Mod => {
            if b == 0.0 {
                Err(RuntimeError::new(RuntimeErrorKind::ModuloByZero))
            } else {
                Ok(Value::Number(a.rem_euclid(b)))
            }
        }
        BinaryOp::Lt => Ok(Value::Bool(a < b)),
        BinaryOp::Le => Ok(Value::Bool(a <= b)),
        BinaryOp::Gt => Ok(Value::Bool(a > b)),
        BinaryOp::Ge => Ok(Value::Bool(a >= b)),
        BinaryOp::Eq | BinaryOp::Ne => unreachable!("handled above"),
    }
}
