//! Integration tests for `Functor` dispatch.
//!
//! Covers:
//! - `map` over Maybe, List, Writer and functions
//! - identity and composition laws
//! - user-declared data types with Fable-written instances
//! - default methods (`replace`)
//! - dispatch failures

use fable_eval::{run_program, EvalConfig, EvalError, Value};
use fable_types::ast::*;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn run(program: Program) -> Value {
    run_program(&program, EvalConfig::default()).expect("evaluation failed")
}

fn eval(main: Expr) -> Value {
    run(Program::new(main))
}

fn eval_err(main: Expr) -> EvalError {
    run_program(&Program::new(main), EvalConfig::default()).expect_err("expected an error")
}

fn just(e: Expr) -> Expr {
    Expr::construct("Just", vec![e])
}

fn nothing() -> Expr {
    Expr::construct("Nothing", vec![])
}

fn writer(log: Expr, value: Expr) -> Expr {
    Expr::construct("Writer", vec![log, value])
}

/// `\x -> x + n`
fn add(n: i64) -> Expr {
    Expr::lambda(&["x"], Expr::binary(BinOp::Add, Expr::var("x"), Expr::int(n)))
}

/// `\x -> x * n`
fn mul(n: i64) -> Expr {
    Expr::lambda(&["x"], Expr::binary(BinOp::Mul, Expr::var("x"), Expr::int(n)))
}

fn tree_data() -> DataDecl {
    DataDecl::new("Tree", &["a"])
        .constructor("Leaf", 0)
        .constructor("Node", 3)
}

/// `map f t = match t { Leaf -> Leaf; Node l x r -> Node (map f l) (f x) (map f r) }`
fn tree_functor() -> InstanceDecl {
    InstanceDecl::new("Functor", "Tree").method(
        "map",
        Expr::lambda(
            &["f", "t"],
            Expr::match_on(
                Expr::var("t"),
                vec![
                    (
                        Pattern::constructor("Leaf", vec![]),
                        Expr::construct("Leaf", vec![]),
                    ),
                    (
                        Pattern::constructor(
                            "Node",
                            vec![Pattern::bind("l"), Pattern::bind("x"), Pattern::bind("r")],
                        ),
                        Expr::construct(
                            "Node",
                            vec![
                                Expr::map(Expr::var("f"), Expr::var("l")),
                                Expr::apply(Expr::var("f"), vec![Expr::var("x")]),
                                Expr::map(Expr::var("f"), Expr::var("r")),
                            ],
                        ),
                    ),
                ],
            ),
        ),
    )
}

fn leaf() -> Value {
    Value::data("Tree", "Leaf", vec![])
}

fn node(l: Value, x: i64, r: Value) -> Value {
    Value::data("Tree", "Node", vec![l, Value::Int(x), r])
}

// ══════════════════════════════════════════════════════════════════════════════
// Built-in functors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn map_over_just_applies_function() {
    assert_eq!(
        eval(Expr::map(add(1), just(Expr::int(1)))),
        Value::just(Value::Int(2))
    );
}

#[test]
fn map_over_nothing_never_calls_function() {
    let explode = Expr::lambda(&["x"], Expr::binary(BinOp::Div, Expr::var("x"), Expr::int(0)));
    assert_eq!(eval(Expr::map(explode, nothing())), Value::nothing());
}

#[test]
fn map_over_list_preserves_length_and_order() {
    assert_eq!(
        eval(Expr::map(mul(2), Expr::ints(&[1, 2, 3]))),
        Value::ints(&[2, 4, 6])
    );
    assert_eq!(eval(Expr::map(mul(2), Expr::ints(&[]))), Value::ints(&[]));
}

#[test]
fn map_over_writer_keeps_log() {
    let w = writer(Expr::list(vec![Expr::str("a")]), Expr::int(2));
    assert_eq!(
        eval(Expr::map(add(1), w)),
        Value::writer(Value::List(vec![Value::str("a")]), Value::Int(3))
    );
}

#[test]
fn map_with_constructor_as_function() {
    assert_eq!(
        eval(Expr::map(Expr::var("Just"), Expr::ints(&[1, 2]))),
        Value::List(vec![Value::just(Value::Int(1)), Value::just(Value::Int(2))])
    );
}

#[test]
fn map_over_function_composes() {
    // (map (+1) (*2)) 5 = 11
    let composed = Expr::map(add(1), mul(2));
    assert_eq!(eval(Expr::apply(composed, vec![Expr::int(5)])), Value::Int(11));
}

#[test]
fn map_on_int_has_no_instance() {
    assert_eq!(
        eval_err(Expr::map(add(1), Expr::int(3))),
        EvalError::NoInstance {
            interface: "Functor".into(),
            type_tag: "Int".into()
        }
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Laws
// ══════════════════════════════════════════════════════════════════════════════

fn samples() -> Vec<Expr> {
    vec![
        just(Expr::int(5)),
        nothing(),
        Expr::ints(&[1, 2, 3]),
        Expr::ints(&[]),
        writer(Expr::list(vec![Expr::str("w")]), Expr::int(1)),
    ]
}

#[test]
fn identity_law_holds_for_builtin_functors() {
    for sample in samples() {
        let mapped = eval(Expr::map(Expr::var("id"), sample.clone()));
        assert_eq!(mapped, eval(sample.clone()), "map id {sample:?}");
    }
}

#[test]
fn composition_law_holds_for_builtin_functors() {
    for sample in samples() {
        let composed = Expr::map(Expr::call("compose", vec![add(1), mul(3)]), sample.clone());
        let nested = Expr::map(add(1), Expr::map(mul(3), sample.clone()));
        assert_eq!(eval(composed), eval(nested), "composition on {sample:?}");
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// User instances & defaults
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn user_functor_instance_dispatches_recursively() {
    let tree = Expr::construct(
        "Node",
        vec![
            Expr::construct("Leaf", vec![]),
            Expr::int(1),
            Expr::construct(
                "Node",
                vec![
                    Expr::construct("Leaf", vec![]),
                    Expr::int(2),
                    Expr::construct("Leaf", vec![]),
                ],
            ),
        ],
    );
    let program = Program::new(Expr::map(mul(10), tree))
        .with_data(tree_data())
        .with_instance(tree_functor());
    assert_eq!(run(program), node(leaf(), 10, node(leaf(), 20, leaf())));
}

#[test]
fn instance_body_may_reference_top_level_binding() {
    let tree_map = Expr::lambda(
        &["f", "t"],
        Expr::match_on(
            Expr::var("t"),
            vec![
                (Pattern::Wildcard, Expr::construct("Leaf", vec![])),
            ],
        ),
    );
    let program = Program::new(Expr::map(add(1), Expr::construct("Leaf", vec![])))
        .with_data(tree_data())
        .with_binding("treeMap", tree_map)
        .with_instance(InstanceDecl::new("Functor", "Tree").method("map", Expr::var("treeMap")));
    assert_eq!(run(program), leaf());
}

#[test]
fn replace_uses_interface_default() {
    let main = Expr::method("Functor", "replace", vec![Expr::int(0), Expr::ints(&[1, 2, 3])]);
    assert_eq!(eval(main), Value::ints(&[0, 0, 0]));
}

#[test]
fn replace_default_works_for_user_instance() {
    let main = Expr::method(
        "Functor",
        "replace",
        vec![
            Expr::str("x"),
            Expr::construct(
                "Node",
                vec![
                    Expr::construct("Leaf", vec![]),
                    Expr::int(1),
                    Expr::construct("Leaf", vec![]),
                ],
            ),
        ],
    );
    let program = Program::new(main)
        .with_data(tree_data())
        .with_instance(tree_functor());
    assert_eq!(
        run(program),
        Value::data("Tree", "Node", vec![leaf(), Value::str("x"), leaf()])
    );
}

#[test]
fn functor_instance_requires_map() {
    let program = Program::new(Expr::unit())
        .with_data(tree_data())
        .with_instance(InstanceDecl::new("Functor", "Tree"));
    let err = run_program(&program, EvalConfig::default()).unwrap_err();
    assert_eq!(
        err,
        EvalError::MissingMethod {
            interface: "Functor".into(),
            type_tag: "Tree".into(),
            method: "map".into()
        }
    );
}

#[test]
fn duplicate_functor_instance_rejected() {
    let program = Program::new(Expr::unit())
        .with_instance(InstanceDecl::new("Functor", "Maybe").method("map", Expr::var("id")));
    let err = run_program(&program, EvalConfig::default()).unwrap_err();
    assert!(matches!(err, EvalError::DuplicateInstance { .. }));
}

#[test]
fn instance_for_unknown_type_rejected() {
    let program = Program::new(Expr::unit())
        .with_instance(InstanceDecl::new("Functor", "Rose").method("map", Expr::var("id")));
    let err = run_program(&program, EvalConfig::default()).unwrap_err();
    assert!(matches!(err, EvalError::InvalidInput(msg) if msg.contains("Rose")));
}
