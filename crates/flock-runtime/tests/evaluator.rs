//! End-to-end evaluator tests over full programs.

use flock_runtime::{Evaluator, Output, OutputValue, RuntimeError};

fn evaluator(source: &str) -> Evaluator {
    let program = flock_compiler::parse(source).expect("program should compile");
    Evaluator::with_seed(program, 7)
}

fn run_step(source: &str, steps: u64) -> Output {
    let mut evaluator = evaluator(source);
    let mut output = None;
    for step in 0..=steps {
        output = Some(evaluator.run(step).expect("step should evaluate"));
    }
    output.expect("at least one step")
}

fn run_err(source: &str) -> RuntimeError {
    let mut evaluator = evaluator(source);
    evaluator.run(0).expect_err("step 0 should fail")
}

fn number(output: &Output, id: &str, name: &str) -> f64 {
    let agent = output
        .agents
        .iter()
        .find(|a| a.id == id)
        .unwrap_or_else(|| panic!("agent '{}' not in output", id));
    match agent.variables.get(name) {
        Some(OutputValue::Number(n)) => *n,
        other => panic!("variable '{}' of '{}' is {:?}", name, id, other),
    }
}

fn boolean(output: &Output, id: &str, name: &str) -> bool {
    let agent = output
        .agents
        .iter()
        .find(|a| a.id == id)
        .unwrap_or_else(|| panic!("agent '{}' not in output", id));
    match agent.variables.get(name) {
        Some(OutputValue::Boolean(b)) => *b,
        other => panic!("variable '{}' of '{}' is {:?}", name, id, other),
    }
}

// === Arithmetic & comparison semantics ===

#[test]
fn test_binary_arithmetic_over_literals() {
    let output = run_step(
        "agent a 1 {
            const add = 6 + 3;
            const sub = 6 - 3;
            const mul = 6 * 3;
            const div = 6 / 3;
            const rem = 7 % 3;
        }",
        0,
    );
    assert_eq!(number(&output, "a-0", "add"), 9.0);
    assert_eq!(number(&output, "a-0", "sub"), 3.0);
    assert_eq!(number(&output, "a-0", "mul"), 18.0);
    assert_eq!(number(&output, "a-0", "div"), 2.0);
    assert_eq!(number(&output, "a-0", "rem"), 1.0);
}

#[test]
fn test_comparisons_over_literals() {
    let output = run_step(
        "agent a 1 {
            const lt = 3 < 4;
            const le = 4 <= 4;
            const gt = 3 > 4;
            const eq = 4 == 4;
            const ne = 3 != 4;
        }",
        0,
    );
    assert!(boolean(&output, "a-0", "lt"));
    assert!(boolean(&output, "a-0", "le"));
    assert!(!boolean(&output, "a-0", "gt"));
    assert!(boolean(&output, "a-0", "eq"));
    assert!(boolean(&output, "a-0", "ne"));
}

#[test]
fn test_logical_and_unary() {
    let output = run_step(
        "agent a 1 {
            const both = true and false;
            const either = true or false;
            const negated = !false;
            const minus = -3;
        }",
        0,
    );
    assert!(!boolean(&output, "a-0", "both"));
    assert!(boolean(&output, "a-0", "either"));
    assert!(boolean(&output, "a-0", "negated"));
    assert_eq!(number(&output, "a-0", "minus"), -3.0);
}

#[test]
fn test_conditional_takes_one_branch() {
    // The untaken branch would divide by zero; it must not be evaluated.
    let output = run_step("agent a 1 { const v = if 1 < 2 then 10 else 10 / 0; }", 0);
    assert_eq!(number(&output, "a-0", "v"), 10.0);
}

#[test]
fn test_division_by_zero() {
    let err = run_err("agent a 1 { const v = 5 / 0; }");
    assert!(err.to_string().contains("division by zero"), "{}", err);
}

#[test]
fn test_modulo_by_zero() {
    let err = run_err("agent a 1 { const v = 5 % 0; }");
    assert!(err.to_string().contains("modulo by zero"), "{}", err);
}

#[test]
fn test_undeclared_identifier() {
    let err = run_err("agent a 1 { const v = missing; }");
    assert!(err.to_string().contains("does not exist"), "{}", err);
}

// === Instantiation, step() and index() ===

#[test]
fn test_index_yields_zero_to_n_minus_one() {
    let output = run_step("agent a 5 { const i = index(); }", 0);
    let indices: Vec<f64> = (0..5)
        .map(|i| number(&output, &format!("a-{}", i), "i"))
        .collect();
    assert_eq!(indices, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_step_returns_current_step() {
    let mut evaluator = evaluator("agent a 1 { property s = step(); }");
    assert_eq!(
        number(&evaluator.run(0).unwrap(), "a-0", "s"),
        0.0
    );
    assert_eq!(
        number(&evaluator.run(1).unwrap(), "a-0", "s"),
        1.0
    );
    assert_eq!(
        number(&evaluator.run(2).unwrap(), "a-0", "s"),
        2.0
    );
}

#[test]
fn test_count_from_define() {
    let output = run_step("define n = 3; agent a n { const i = index(); }", 0);
    assert_eq!(output.agents.len(), 3);
    assert_eq!(number(&output, "a-2", "i"), 2.0);
}

#[test]
fn test_agent_ids_are_type_dash_index() {
    let output = run_step("agent ant 2 {} agent bee 1 {}", 0);
    let ids: Vec<&str> = output.agents.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["ant-0", "ant-1", "bee-0"]);
}

#[test]
fn test_define_must_be_literal() {
    let err = run_err("define n = 1 + 2; agent a n {}");
    assert!(
        err.to_string().contains("number or boolean literal"),
        "{}",
        err
    );
}

#[test]
fn test_fractional_count_is_rejected() {
    let err = run_err("define n = 2.5; agent a n {}");
    assert!(err.to_string().contains("whole number"), "{}", err);
}

// === Const carry-forward and property recurrence ===

#[test]
fn test_const_carries_forward_by_value() {
    let mut evaluator = evaluator("agent a 1 { const r = random(0, 1000); }");
    let first = number(&evaluator.run(0).unwrap(), "a-0", "r");
    let second = number(&evaluator.run(1).unwrap(), "a-0", "r");
    let third = number(&evaluator.run(2).unwrap(), "a-0", "r");
    assert_eq!(first, second);
    assert_eq!(second, third);
}

#[test]
fn test_property_default_seeds_recurrence() {
    let mut evaluator = evaluator("agent a 1 { property n: 0 = n + 1; }");
    assert_eq!(number(&evaluator.run(0).unwrap(), "a-0", "n"), 0.0);
    assert_eq!(number(&evaluator.run(1).unwrap(), "a-0", "n"), 1.0);
    assert_eq!(number(&evaluator.run(2).unwrap(), "a-0", "n"), 2.0);
}

#[test]
fn test_property_without_default_evaluates_value_at_step_zero() {
    let output = run_step("agent a 1 { property v = 5 * 2; }", 0);
    assert_eq!(number(&output, "a-0", "v"), 10.0);
}

#[test]
fn test_sibling_dependency_resolves_at_step_zero() {
    // `twice` reads `base` within the same step-0 pass; the resolver has
    // already moved `base` first.
    let output = run_step(
        "agent a 1 {
            property twice = base * 2;
            property base: 21 = base;
        }",
        0,
    );
    assert_eq!(number(&output, "a-0", "twice"), 42.0);
}

#[test]
fn test_step_one_reads_previous_snapshot() {
    // At step >= 1 `follower` reads the committed step-0 value of `leader`,
    // not the value being computed in the same pass.
    let mut evaluator = evaluator(
        "agent a 1 {
            property leader: 0 = leader + 1;
            property follower = leader;
        }",
    );
    evaluator.run(0).unwrap();
    let output = evaluator.run(1).unwrap();
    assert_eq!(number(&output, "a-0", "leader"), 1.0);
    assert_eq!(number(&output, "a-0", "follower"), 0.0);
}

// === reset() ===

#[test]
fn test_reset_restarts_from_step_zero() {
    let mut evaluator = evaluator("agent a 1 { property n: 0 = n + 1; }");
    evaluator.run(0).unwrap();
    evaluator.run(1).unwrap();
    evaluator.reset();
    assert_eq!(number(&evaluator.run(0).unwrap(), "a-0", "n"), 0.0);
}

// === Builtins ===

#[test]
fn test_math_builtins() {
    let output = run_step(
        "agent a 1 {
            const root = sqrt(16);
            const magnitude = abs(0 - 3);
            const low = floor(2.7);
            const high = ceil(2.2);
            const near = round(2.5);
            const d = dist(0, 0, 3, 4);
        }",
        0,
    );
    assert_eq!(number(&output, "a-0", "root"), 4.0);
    assert_eq!(number(&output, "a-0", "magnitude"), 3.0);
    assert_eq!(number(&output, "a-0", "low"), 2.0);
    assert_eq!(number(&output, "a-0", "high"), 3.0);
    assert_eq!(number(&output, "a-0", "near"), 3.0);
    assert_eq!(number(&output, "a-0", "d"), 5.0);
}

#[test]
fn test_random_respects_bounds() {
    let output = run_step("agent a 20 { const r = random(5, 6); }", 0);
    for agent in &output.agents {
        let Some(OutputValue::Number(r)) = agent.variables.get("r") else {
            panic!("missing r");
        };
        assert!((5.0..6.0).contains(r), "out of range: {}", r);
    }
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let source = "agent a 3 { const r = random(0, 100); }";
    let a = run_step(source, 0);
    let b = run_step(source, 0);
    assert_eq!(a, b);
}

#[test]
fn test_prob_validates_range() {
    let err = run_err("agent a 1 { const p = prob(1.5); }");
    assert!(err.to_string().contains("between 0 and 1"), "{}", err);
}

#[test]
fn test_choice_requires_same_kinds() {
    let err = run_err("agent a 1 { const c = choice(1, true); }");
    assert!(err.to_string().contains("choice"), "{}", err);
}

#[test]
fn test_arity_is_validated() {
    let err = run_err("agent a 1 { const v = sqrt(1, 2); }");
    assert!(err.to_string().contains("expects 1 argument"), "{}", err);
}

#[test]
fn test_count_and_empty() {
    let mut evaluator = evaluator(
        "agent a 4 {
            property others = count(agents(a));
            property none = count(empty());
        }",
    );
    // At step 0 each instance only sees the instances registered before it.
    let step0 = evaluator.run(0).unwrap();
    assert_eq!(number(&step0, "a-0", "others"), 0.0);
    assert_eq!(number(&step0, "a-3", "others"), 3.0);
    // From step 1 onward everyone reads the complete previous snapshot,
    // still excluding themselves.
    let step1 = evaluator.run(1).unwrap();
    assert_eq!(number(&step1, "a-0", "others"), 3.0);
    assert_eq!(number(&step1, "a-0", "none"), 0.0);
}

#[test]
fn test_comprehension_sum() {
    let mut evaluator = evaluator(
        "agent a 3 {
            const one = 1;
            property total = sum(agents(a) => other => other.one);
        }",
    );
    evaluator.run(0).unwrap();
    let output = evaluator.run(1).unwrap();
    assert_eq!(number(&output, "a-0", "total"), 2.0);
}

#[test]
fn test_comprehension_min_max() {
    let mut evaluator = evaluator(
        "agent a 3 {
            const mine = index() * 10;
            property lowest = min(agents(a) => other => other.mine);
            property highest = max(agents(a) => other => other.mine);
        }",
    );
    evaluator.run(0).unwrap();
    let output = evaluator.run(1).unwrap();
    // For a-0, the others hold 10 and 20.
    assert_eq!(number(&output, "a-0", "lowest"), 10.0);
    assert_eq!(number(&output, "a-0", "highest"), 20.0);
}

#[test]
fn test_filter_keeps_matching_agents() {
    let mut evaluator = evaluator(
        "agent a 4 {
            const even = index() % 2 == 0;
            property others_even = count(filter(agents(a) => other => other.even));
        }",
    );
    evaluator.run(0).unwrap();
    let output = evaluator.run(1).unwrap();
    // a-1 sees a-0, a-2, a-3; two of them are even.
    assert_eq!(number(&output, "a-1", "others_even"), 2.0);
}

#[test]
fn test_filter_requires_boolean_results() {
    let mut evaluator = evaluator(
        "agent a 2 {
            const n = 1;
            property bad = count(filter(agents(a) => other => other.n));
        }",
    );
    let err = evaluator.run(0).unwrap_err();
    assert!(err.to_string().contains("boolean"), "{}", err);
}

#[test]
fn test_min_over_empty_comprehension_is_null_for_otherwise() {
    let output = run_step(
        "agent lone 1 {
            property nearest = min(agents(lone) => other => other.x) otherwise 0 - 1;
        }",
        0,
    );
    assert_eq!(number(&output, "lone-0", "nearest"), -1.0);
}

#[test]
fn test_find_by_coordinates() {
    let mut evaluator = evaluator(
        "agent ant 3 {
            const x = index();
            const y = 0;
        }
        agent probe 1 {
            property hit = find_by_coordinates(agents(ant), 1, 0).x otherwise 0 - 1;
            property miss = find_by_coordinates(agents(ant), 9, 9).x otherwise 0 - 1;
        }",
    );
    evaluator.run(0).unwrap();
    let output = evaluator.run(1).unwrap();
    assert_eq!(number(&output, "probe-0", "hit"), 1.0);
    assert_eq!(number(&output, "probe-0", "miss"), -1.0);
}

// === otherwise ===

#[test]
fn test_otherwise_takes_left_when_it_succeeds() {
    let output = run_step("agent a 1 { const v = 5 otherwise 42; }", 0);
    assert_eq!(number(&output, "a-0", "v"), 5.0);
}

#[test]
fn test_otherwise_recovers_missing_property() {
    let mut evaluator = evaluator(
        "agent ant 2 {
            const x = index();
            const y = 0;
        }
        agent probe 1 {
            property v = find_by_coordinates(agents(ant), 0, 0).missing otherwise 42;
        }",
    );
    evaluator.run(0).unwrap();
    let output = evaluator.run(1).unwrap();
    assert_eq!(number(&output, "probe-0", "v"), 42.0);
}

#[test]
fn test_otherwise_takes_actual_property_value_when_present() {
    let mut evaluator = evaluator(
        "agent ant 1 {
            const x = 0;
            const y = 0;
            const worth = 7;
        }
        agent probe 1 {
            property v = find_by_coordinates(agents(ant), 0, 0).worth otherwise 42;
        }",
    );
    evaluator.run(0).unwrap();
    let output = evaluator.run(1).unwrap();
    assert_eq!(number(&output, "probe-0", "v"), 7.0);
}

#[test]
fn test_error_without_otherwise_is_fatal() {
    let mut evaluator = evaluator(
        "agent ant 1 {
            const x = 0;
            const y = 0;
        }
        agent probe 1 {
            property v = find_by_coordinates(agents(ant), 0, 0).missing;
        }",
    );
    // Fails at step 0 already: the builder carries ant's filled variables.
    let err = evaluator.run(0).unwrap_err();
    assert!(err.to_string().contains("has no property"), "{}", err);
}

// === Output shape ===

#[test]
fn test_output_contains_only_scalars() {
    let output = run_step(
        "agent a 2 {
            const flock = agents(a);
            const size = count(agents(a));
        }",
        0,
    );
    let agent = &output.agents[0];
    assert!(agent.variables.contains_key("size"));
    // Agent-list values never escape to the external output.
    assert!(!agent.variables.contains_key("flock"));
}

#[test]
fn test_output_serializes_to_tagged_json() {
    let output = run_step("agent a 1 { const n = 1.5; const b = true; }", 0);
    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["step"], 0);
    assert_eq!(json["agents"][0]["id"], "a-0");
    assert_eq!(json["agents"][0]["type"], "a");
    assert_eq!(json["agents"][0]["variables"]["n"]["kind"], "number");
    assert_eq!(json["agents"][0]["variables"]["n"]["value"], 1.5);
    assert_eq!(json["agents"][0]["variables"]["b"]["kind"], "boolean");
}
