//! Integration tests for `Foldable` and `Monoid`.
//!
//! `foldl` is strict, `foldr` suspends its accumulator; the stats counters
//! make the difference observable.

use fable_eval::{fold, run_program, EvalConfig, EvalError, EvalStats, Evaluator, Value};
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

/// Evaluate `main` and report the counters.
fn eval_with_stats(main: Expr) -> (Value, EvalStats) {
    let mut ev = Evaluator::with_prelude(EvalConfig::default()).expect("prelude");
    let value = ev.run(&Program::new(main)).expect("evaluation failed");
    (value, ev.stats())
}

fn var(name: &str) -> Expr {
    Expr::var(name)
}

fn op(op: BinOp) -> Expr {
    Expr::lambda(&["a", "b"], Expr::binary(op, var("a"), var("b")))
}

fn just(e: Expr) -> Expr {
    Expr::construct("Just", vec![e])
}

fn nothing() -> Expr {
    Expr::construct("Nothing", vec![])
}

fn range(from: i64, to: i64) -> Expr {
    Expr::ints(&(from..=to).collect::<Vec<_>>())
}

// ══════════════════════════════════════════════════════════════════════════════
// Lists
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn folds_associate_in_opposite_directions() {
    // foldl (-) 0 [1,2,3] = ((0 - 1) - 2) - 3
    assert_eq!(eval(Expr::foldl(op(BinOp::Sub), Expr::int(0), Expr::ints(&[1, 2, 3]))), Value::Int(-6));
    // foldr (-) 0 [1,2,3] = 1 - (2 - (3 - 0))
    assert_eq!(eval(Expr::foldr(op(BinOp::Sub), Expr::int(0), Expr::ints(&[1, 2, 3]))), Value::Int(2));
}

#[test]
fn folds_over_empty_list_return_seed() {
    assert_eq!(eval(Expr::foldl(op(BinOp::Add), Expr::int(9), Expr::ints(&[]))), Value::Int(9));
    assert_eq!(eval(Expr::foldr(op(BinOp::Add), Expr::int(9), Expr::ints(&[]))), Value::Int(9));
}

#[test]
fn foldl_cons_reverses_and_foldr_cons_preserves() {
    let snoc = Expr::lambda(
        &["acc", "x"],
        Expr::binary(BinOp::Append, Expr::list(vec![var("x")]), var("acc")),
    );
    let cons = Expr::lambda(
        &["x", "acc"],
        Expr::binary(BinOp::Append, Expr::list(vec![var("x")]), var("acc")),
    );
    assert_eq!(
        eval(Expr::foldl(snoc, Expr::list(vec![]), Expr::ints(&[1, 2, 3]))),
        Value::ints(&[3, 2, 1])
    );
    assert_eq!(
        eval(Expr::foldr(cons, Expr::list(vec![]), Expr::ints(&[1, 2, 3]))),
        Value::ints(&[1, 2, 3])
    );
}

#[test]
fn foldr_stops_when_accumulator_is_unused() {
    // foldr (\x acc -> if x == 5 then x else acc) 0 [1..1000]
    let find_five = |params: &[&str]| {
        Expr::lambda(
            params,
            Expr::if_then_else(
                Expr::binary(BinOp::Eq, var("x"), Expr::int(5)),
                var("x"),
                var("acc"),
            ),
        )
    };

    let (lazy, lazy_stats) = eval_with_stats(Expr::foldr(
        find_five(&["x", "acc"]),
        Expr::int(0),
        range(1, 1000),
    ));
    assert_eq!(lazy, Value::Int(5));
    assert!(
        lazy_stats.applications < 20,
        "foldr applied {} times",
        lazy_stats.applications
    );

    let (strict, strict_stats) = eval_with_stats(Expr::foldl(
        find_five(&["acc", "x"]),
        Expr::int(0),
        range(1, 1000),
    ));
    assert_eq!(strict, Value::Int(5));
    assert!(strict_stats.applications >= 1000);
}

#[test]
fn foldr_never_forces_ignored_accumulator() {
    let first = Expr::lambda(&["x", "_"], var("x"));
    let (value, stats) = eval_with_stats(Expr::foldr(first, Expr::int(0), Expr::ints(&[7, 8, 9])));
    assert_eq!(value, Value::Int(7));
    assert_eq!(stats.thunks_forced, 0);
}

#[test]
fn foldr_forces_each_suspension_once() {
    let (value, stats) =
        eval_with_stats(Expr::foldr(op(BinOp::Add), Expr::int(0), Expr::ints(&[1, 2, 3])));
    assert_eq!(value, Value::Int(6));
    assert_eq!(stats.thunks_forced, 3);
}

#[test]
fn foldr_accumulator_is_memoized() {
    // foldr (\x acc -> x + acc + acc) 0 [1, 2] = 1 + 2 + 2
    let twice = Expr::lambda(
        &["x", "acc"],
        Expr::binary(
            BinOp::Add,
            Expr::binary(BinOp::Add, var("x"), var("acc")),
            var("acc"),
        ),
    );
    let (value, stats) = eval_with_stats(Expr::foldr(twice, Expr::int(0), Expr::ints(&[1, 2])));
    assert_eq!(value, Value::Int(5));
    assert_eq!(stats.thunks_forced, 2);
}

#[test]
fn foldr_with_or_stops_at_first_match() {
    // any (> 2) via foldr with ||
    let any_big = Expr::lambda(
        &["x", "acc"],
        Expr::binary(
            BinOp::Or,
            Expr::binary(BinOp::Greater, var("x"), Expr::int(2)),
            var("acc"),
        ),
    );
    let (value, stats) =
        eval_with_stats(Expr::foldr(any_big, Expr::bool(false), range(1, 500)));
    assert_eq!(value, Value::Bool(true));
    assert_eq!(stats.thunks_forced, 2);
}

// ══════════════════════════════════════════════════════════════════════════════
// Maybe & Writer
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn strict_foldr_nests_one_call_per_element() {
    assert_eq!(eval(Expr::foldr(op(BinOp::Add), Expr::int(0), range(1, 150))), Value::Int(11325));
    assert_eq!(
        eval_err(Expr::foldr(op(BinOp::Add), Expr::int(0), range(1, 1000))),
        EvalError::DepthExceeded(200)
    );
    assert_eq!(eval(Expr::foldl(op(BinOp::Add), Expr::int(0), range(1, 1000))), Value::Int(500500));
}

#[test]
fn maybe_folds_over_zero_or_one_element() {
    assert_eq!(eval(Expr::foldr(op(BinOp::Add), Expr::int(10), just(Expr::int(5)))), Value::Int(15));
    assert_eq!(eval(Expr::foldr(op(BinOp::Add), Expr::int(10), nothing())), Value::Int(10));
    assert_eq!(eval(Expr::foldl(op(BinOp::Sub), Expr::int(10), just(Expr::int(3)))), Value::Int(7));
    assert_eq!(eval(Expr::foldl(op(BinOp::Sub), Expr::int(10), nothing())), Value::Int(10));
}

#[test]
fn writer_folds_over_its_value() {
    let w = Expr::construct("Writer", vec![Expr::list(vec![Expr::str("log")]), Expr::int(41)]);
    assert_eq!(eval(Expr::foldl(op(BinOp::Add), Expr::int(1), w)), Value::Int(42));
}

// ══════════════════════════════════════════════════════════════════════════════
// Default methods
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn length_sum_and_to_list_defaults() {
    let length = |t: Expr| Expr::method("Foldable", "length", vec![t]);
    let sum = |t: Expr| Expr::method("Foldable", "sum", vec![t]);
    let to_list = |t: Expr| Expr::method("Foldable", "toList", vec![t]);

    assert_eq!(eval(length(Expr::ints(&[4, 5, 6]))), Value::Int(3));
    assert_eq!(eval(length(nothing())), Value::Int(0));
    assert_eq!(eval(sum(Expr::ints(&[4, 5, 6]))), Value::Int(15));
    assert_eq!(eval(sum(just(Expr::int(8)))), Value::Int(8));
    assert_eq!(eval(to_list(just(Expr::int(3)))), Value::ints(&[3]));
    assert_eq!(eval(to_list(nothing())), Value::ints(&[]));
}

#[test]
fn fold_on_int_has_no_instance() {
    assert_eq!(
        eval_err(Expr::foldl(op(BinOp::Add), Expr::int(0), Expr::int(5))),
        EvalError::NoInstance {
            interface: "Foldable".into(),
            type_tag: "Int".into()
        }
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Monoid
// ══════════════════════════════════════════════════════════════════════════════

fn mconcat_at(type_name: &str, items: Expr) -> Expr {
    Expr::method_at("Monoid", "mconcat", type_name, vec![items])
}

#[test]
fn mconcat_combines_with_each_monoid() {
    assert_eq!(eval(mconcat_at("Int", Expr::ints(&[1, 2, 3]))), Value::Int(6));
    assert_eq!(
        eval(mconcat_at(
            "String",
            Expr::list(vec![Expr::str("a"), Expr::str("b"), Expr::str("c")])
        )),
        Value::str("abc")
    );
    assert_eq!(
        eval(mconcat_at(
            "List",
            Expr::list(vec![Expr::ints(&[1]), Expr::ints(&[]), Expr::ints(&[2, 3])])
        )),
        Value::ints(&[1, 2, 3])
    );
    assert_eq!(
        eval(mconcat_at(
            "Maybe",
            Expr::list(vec![just(Expr::ints(&[1])), nothing(), just(Expr::ints(&[2]))])
        )),
        Value::just(Value::ints(&[1, 2]))
    );
}

#[test]
fn mconcat_of_empty_list_is_mempty() {
    assert_eq!(eval(mconcat_at("Int", Expr::ints(&[]))), Value::Int(0));
    assert_eq!(eval(mconcat_at("Maybe", Expr::list(vec![]))), Value::nothing());
}

#[test]
fn mempty_needs_explicit_type() {
    let err = eval_err(Expr::method("Monoid", "mempty", vec![]));
    assert!(matches!(err, EvalError::TypeMismatch(msg) if msg.contains("explicit type")));
}

#[test]
fn mconcat_from_rust() {
    let mut ev = Evaluator::with_prelude(EvalConfig::default()).unwrap();
    let joined = fold::mconcat(&mut ev, "String", vec![Value::str("x"), Value::str("y")]).unwrap();
    assert_eq!(joined, Value::str("xy"));
    let total = fold::mconcat(&mut ev, "Int", Vec::new()).unwrap();
    assert_eq!(total, Value::Int(0));
}

#[test]
fn folds_from_rust() {
    let mut ev = Evaluator::with_prelude(EvalConfig::default()).unwrap();
    let sub = ev.eval(&op(BinOp::Sub)).unwrap();

    let left = fold::foldl_strict(&mut ev, sub.clone(), Value::Int(0), vec![Value::Int(1), Value::Int(2)]).unwrap();
    assert_eq!(left, Value::Int(-3));

    let right = fold::foldr_lazy(&mut ev, sub, Value::Int(0), vec![Value::Int(1), Value::Int(2)]).unwrap();
    let right = ev.force_deep(right).unwrap();
    assert_eq!(right, Value::Int(-1));
}

// ══════════════════════════════════════════════════════════════════════════════
// User Foldable
// ══════════════════════════════════════════════════════════════════════════════

fn tree_program(main: Expr) -> Program {
    let tree_foldr = Expr::lambda(
        &["f", "z", "t"],
        Expr::match_on(
            var("t"),
            vec![
                (Pattern::constructor("Leaf", vec![]), var("z")),
                (
                    Pattern::constructor(
                        "Node",
                        vec![Pattern::bind("l"), Pattern::bind("x"), Pattern::bind("r")],
                    ),
                    Expr::foldr(
                        var("f"),
                        Expr::apply(var("f"), vec![var("x"), Expr::foldr(var("f"), var("z"), var("r"))]),
                        var("l"),
                    ),
                ),
            ],
        ),
    );
    let tree_foldl = Expr::lambda(
        &["f", "z", "t"],
        Expr::foldl(var("f"), var("z"), Expr::method("Foldable", "toList", vec![var("t")])),
    );
    Program::new(main)
        .with_data(
            DataDecl::new("Tree", &["a"])
                .constructor("Leaf", 0)
                .constructor("Node", 3),
        )
        .with_instance(
            InstanceDecl::new("Foldable", "Tree")
                .method("foldr", tree_foldr)
                .method("foldl", tree_foldl),
        )
}

fn sample_tree() -> Expr {
    let leaf = || Expr::construct("Leaf", vec![]);
    let single = |n| Expr::construct("Node", vec![leaf(), Expr::int(n), leaf()]);
    Expr::construct("Node", vec![single(1), Expr::int(2), single(3)])
}

#[test]
fn user_foldable_gets_defaults() {
    assert_eq!(
        run(tree_program(Expr::method("Foldable", "toList", vec![sample_tree()]))),
        Value::ints(&[1, 2, 3])
    );
    assert_eq!(
        run(tree_program(Expr::method("Foldable", "sum", vec![sample_tree()]))),
        Value::Int(6)
    );
    assert_eq!(
        run(tree_program(Expr::method("Foldable", "length", vec![sample_tree()]))),
        Value::Int(3)
    );
}

#[test]
fn user_foldable_folds_in_order() {
    assert_eq!(
        run(tree_program(Expr::foldr(op(BinOp::Sub), Expr::int(0), sample_tree()))),
        Value::Int(2)
    );
    assert_eq!(
        run(tree_program(Expr::foldl(op(BinOp::Sub), Expr::int(0), sample_tree()))),
        Value::Int(-6)
    );
}
