//! Left and right folds.
//!
//! `foldl` is strict: the accumulator is forced after every step, so no
//! chain of suspended additions builds up. `foldr` is lazy in its
//! accumulator: the combining function receives the rest of the fold as a
//! memoized thunk, and a function that never forces it ends the traversal.

use crate::error::EvalResult;
use crate::evaluator::Evaluator;
use crate::prelude::MONOID;
use crate::value::{Suspended, Thunk, Value};
use std::rc::Rc;

/// `foldl f z [x1, .., xn] = f (.. (f z x1) ..) xn`, forcing each step.
pub fn foldl_strict(
    eval: &mut Evaluator,
    func: Value,
    seed: Value,
    items: Vec<Value>,
) -> EvalResult<Value> {
    let mut acc = eval.force(seed)?;
    for item in items {
        let next = eval.apply(func.clone(), vec![acc, item])?;
        acc = eval.force(next)?;
    }
    Ok(acc)
}

/// `foldr f z [x1, .., xn] = f x1 (f x2 (.. (f xn z)))`, with every
/// inner fold suspended.
///
/// Each forced suspension calls `f` again from inside the caller's call,
/// so an `f` that always forces its accumulator nests one closure call per
/// element and fails with `DepthExceeded` once the list is longer than
/// `EvalConfig::max_depth`. Use `foldl` for strict reductions.
pub fn foldr_lazy(
    eval: &mut Evaluator,
    func: Value,
    seed: Value,
    items: Vec<Value>,
) -> EvalResult<Value> {
    foldr_from(eval, func, seed, Rc::from(items), 0)
}

/// One step of a right fold starting at `start`.
pub(crate) fn foldr_from(
    eval: &mut Evaluator,
    func: Value,
    seed: Value,
    items: Rc<[Value]>,
    start: usize,
) -> EvalResult<Value> {
    let Some(head) = items.get(start).cloned() else {
        return Ok(seed);
    };
    let rest = Value::Thunk(Thunk::new(Suspended::FoldRight {
        func: func.clone(),
        seed,
        items: Rc::clone(&items),
        start: start + 1,
    }));
    eval.apply(func, vec![head, rest])
}

/// Combine values with the `Monoid` instance of `type_tag`, right to left,
/// starting from its `mempty`.
pub fn mconcat(eval: &mut Evaluator, type_tag: &str, items: Vec<Value>) -> EvalResult<Value> {
    let mut acc = eval.call_method(MONOID, "mempty", Some(type_tag), Vec::new())?;
    for item in items.into_iter().rev() {
        acc = eval.call_method(MONOID, "mappend", Some(type_tag), vec![item, acc])?;
    }
    eval.force_deep(acc)
}
