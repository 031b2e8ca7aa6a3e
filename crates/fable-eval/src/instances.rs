//! Native instances for the built-in types.
//!
//! | Type       | Functor | Monad | Foldable | Monoid |
//! |------------|---------|-------|----------|--------|
//! | `Maybe`    | yes     | yes   | yes      | yes    |
//! | `List`     | yes     | yes   | yes      | yes    |
//! | `Writer`   | yes     | yes   | yes      |        |
//! | `Function` | yes     |       |          |        |
//! | `Int`      |         |       |          | yes    |
//! | `String`   |         |       |          | yes    |
//! | `Unit`     |         |       |          | yes    |

use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::fold;
use crate::prelude::{FOLDABLE, FUNCTOR, MONAD, MONOID};
use crate::registry::Instance;
use crate::value::{tags, NativeFn, Value};

/// Every native instance, superinstances first.
pub fn native_instances() -> Vec<Instance> {
    vec![
        // ── Maybe ──
        Instance::new(FUNCTOR, tags::MAYBE).native("map", MAYBE_MAP),
        Instance::new(MONAD, tags::MAYBE)
            .native("pure", MAYBE_PURE)
            .native("bind", MAYBE_BIND),
        Instance::new(FOLDABLE, tags::MAYBE)
            .native("foldr", MAYBE_FOLDR)
            .native("foldl", MAYBE_FOLDL),
        Instance::new(MONOID, tags::MAYBE)
            .native("mempty", MAYBE_MEMPTY)
            .native("mappend", MAYBE_MAPPEND),
        // ── List ──
        Instance::new(FUNCTOR, tags::LIST).native("map", LIST_MAP),
        Instance::new(MONAD, tags::LIST)
            .native("pure", LIST_PURE)
            .native("bind", LIST_BIND),
        Instance::new(FOLDABLE, tags::LIST)
            .native("foldr", LIST_FOLDR)
            .native("foldl", LIST_FOLDL),
        Instance::new(MONOID, tags::LIST)
            .native("mempty", LIST_MEMPTY)
            .native("mappend", LIST_MAPPEND),
        // ── Writer ──
        Instance::new(FUNCTOR, tags::WRITER).native("map", WRITER_MAP),
        Instance::new(MONAD, tags::WRITER)
            .native("pure", WRITER_PURE)
            .native("bind", WRITER_BIND),
        Instance::new(FOLDABLE, tags::WRITER)
            .native("foldr", WRITER_FOLDR)
            .native("foldl", WRITER_FOLDL),
        // ── Function ──
        Instance::new(FUNCTOR, tags::FUNCTION).native("map", FUNCTION_MAP),
        // ── Monoids on scalars ──
        Instance::new(MONOID, tags::INT)
            .native("mempty", INT_MEMPTY)
            .native("mappend", INT_MAPPEND),
        Instance::new(MONOID, tags::STRING)
            .native("mempty", STRING_MEMPTY)
            .native("mappend", STRING_MAPPEND),
        Instance::new(MONOID, tags::UNIT)
            .native("mempty", UNIT_MEMPTY)
            .native("mappend", UNIT_MAPPEND),
    ]
}

// ── Argument helpers ─────────────────────────────────────────────────────────

fn take<const N: usize>(name: &str, args: Vec<Value>) -> EvalResult<[Value; N]> {
    args.try_into().map_err(|args: Vec<Value>| EvalError::ArityMismatch {
        name: name.to_string(),
        expected: N,
        found: args.len(),
    })
}

fn expect_list(eval: &mut Evaluator, value: Value, context: &str) -> EvalResult<Vec<Value>> {
    match eval.force(value)? {
        Value::List(items) => Ok(items),
        other => Err(EvalError::TypeMismatch(format!(
            "{context} expects List, got {}",
            other.type_tag()
        ))),
    }
}

/// Force `value` and check it is a constructor of `type_name`.
fn expect_data(
    eval: &mut Evaluator,
    value: Value,
    type_name: &str,
    context: &str,
) -> EvalResult<(String, Vec<Value>)> {
    match eval.force(value)? {
        Value::Data {
            type_name: actual,
            constructor,
            fields,
        } if actual == type_name => Ok((constructor, fields)),
        other => Err(EvalError::TypeMismatch(format!(
            "{context} expects {type_name}, got {}",
            other.type_tag()
        ))),
    }
}

/// Split a `Maybe` into its payload.
fn maybe_payload(eval: &mut Evaluator, value: Value, context: &str) -> EvalResult<Option<Value>> {
    let (constructor, mut fields) = expect_data(eval, value, tags::MAYBE, context)?;
    match (constructor.as_str(), fields.len()) {
        ("Just", 1) => Ok(fields.pop()),
        ("Nothing", 0) => Ok(None),
        _ => Err(EvalError::TypeMismatch(format!(
            "{context}: malformed Maybe value '{constructor}'"
        ))),
    }
}

/// Split a `Writer` into `(log, value)`.
fn writer_parts(eval: &mut Evaluator, value: Value, context: &str) -> EvalResult<(Value, Value)> {
    let (_, fields) = expect_data(eval, value, tags::WRITER, context)?;
    let [log, value] = take::<2>(context, fields)?;
    Ok((log, value))
}

// ══════════════════════════════════════════════════════════════════════════════
// Maybe
// ══════════════════════════════════════════════════════════════════════════════

const MAYBE_MAP: NativeFn = NativeFn::new("Maybe.map", 2, |eval, args| {
    let [func, maybe] = take::<2>("Maybe.map", args)?;
    match maybe_payload(eval, maybe, "map")? {
        Some(x) => Ok(Value::just(eval.apply(func, vec![x])?)),
        None => Ok(Value::nothing()),
    }
});

const MAYBE_PURE: NativeFn = NativeFn::new("Maybe.pure", 1, |_, args| {
    let [x] = take::<1>("Maybe.pure", args)?;
    Ok(Value::just(x))
});

const MAYBE_BIND: NativeFn = NativeFn::new("Maybe.bind", 2, |eval, args| {
    let [maybe, func] = take::<2>("Maybe.bind", args)?;
    match maybe_payload(eval, maybe, "bind")? {
        Some(x) => {
            let result = eval.apply(func, vec![x])?;
            let result = eval.force(result)?;
            if result.type_tag() != tags::MAYBE {
                return Err(EvalError::TypeMismatch(format!(
                    "bind on Maybe must return Maybe, got {}",
                    result.type_tag()
                )));
            }
            Ok(result)
        }
        None => Ok(Value::nothing()),
    }
});

const MAYBE_FOLDR: NativeFn = NativeFn::new("Maybe.foldr", 3, |eval, args| {
    let [func, seed, maybe] = take::<3>("Maybe.foldr", args)?;
    match maybe_payload(eval, maybe, "foldr")? {
        Some(x) => eval.apply(func, vec![x, seed]),
        None => Ok(seed),
    }
});

const MAYBE_FOLDL: NativeFn = NativeFn::new("Maybe.foldl", 3, |eval, args| {
    let [func, seed, maybe] = take::<3>("Maybe.foldl", args)?;
    let items = maybe_payload(eval, maybe, "foldl")?.into_iter().collect();
    fold::foldl_strict(eval, func, seed, items)
});

const MAYBE_MEMPTY: NativeFn = NativeFn::new("Maybe.mempty", 0, |_, _| Ok(Value::nothing()));

/// `Nothing` is the identity; two `Just`s combine their payloads.
const MAYBE_MAPPEND: NativeFn = NativeFn::new("Maybe.mappend", 2, |eval, args| {
    let [left, right] = take::<2>("Maybe.mappend", args)?;
    let left = maybe_payload(eval, left, "mappend")?;
    let right = maybe_payload(eval, right, "mappend")?;
    match (left, right) {
        (Some(a), Some(b)) => {
            let combined = eval.call_method(MONOID, "mappend", None, vec![a, b])?;
            Ok(Value::just(combined))
        }
        (Some(a), None) | (None, Some(a)) => Ok(Value::just(a)),
        (None, None) => Ok(Value::nothing()),
    }
});

// ══════════════════════════════════════════════════════════════════════════════
// List
// ══════════════════════════════════════════════════════════════════════════════

const LIST_MAP: NativeFn = NativeFn::new("List.map", 2, |eval, args| {
    let [func, list] = take::<2>("List.map", args)?;
    let items = expect_list(eval, list, "map")?;
    let mut mapped = Vec::with_capacity(items.len());
    for item in items {
        mapped.push(eval.apply(func.clone(), vec![item])?);
    }
    Ok(Value::List(mapped))
});

const LIST_PURE: NativeFn = NativeFn::new("List.pure", 1, |_, args| {
    let [x] = take::<1>("List.pure", args)?;
    Ok(Value::List(vec![x]))
});

/// `bind xs f = concat (map f xs)`
const LIST_BIND: NativeFn = NativeFn::new("List.bind", 2, |eval, args| {
    let [list, func] = take::<2>("List.bind", args)?;
    let items = expect_list(eval, list, "bind")?;
    let mut out = Vec::new();
    for item in items {
        let result = eval.apply(func.clone(), vec![item])?;
        out.extend(expect_list(eval, result, "bind on List result")?);
    }
    Ok(Value::List(out))
});

const LIST_FOLDR: NativeFn = NativeFn::new("List.foldr", 3, |eval, args| {
    let [func, seed, list] = take::<3>("List.foldr", args)?;
    let items = expect_list(eval, list, "foldr")?;
    fold::foldr_lazy(eval, func, seed, items)
});

const LIST_FOLDL: NativeFn = NativeFn::new("List.foldl", 3, |eval, args| {
    let [func, seed, list] = take::<3>("List.foldl", args)?;
    let items = expect_list(eval, list, "foldl")?;
    fold::foldl_strict(eval, func, seed, items)
});

const LIST_MEMPTY: NativeFn = NativeFn::new("List.mempty", 0, |_, _| Ok(Value::List(Vec::new())));

const LIST_MAPPEND: NativeFn = NativeFn::new("List.mappend", 2, |eval, args| {
    let [left, right] = take::<2>("List.mappend", args)?;
    let mut items = expect_list(eval, left, "mappend")?;
    items.extend(expect_list(eval, right, "mappend")?);
    Ok(Value::List(items))
});

// ══════════════════════════════════════════════════════════════════════════════
// Writer
// ══════════════════════════════════════════════════════════════════════════════

const WRITER_MAP: NativeFn = NativeFn::new("Writer.map", 2, |eval, args| {
    let [func, writer] = take::<2>("Writer.map", args)?;
    let (log, value) = writer_parts(eval, writer, "map")?;
    Ok(Value::writer(log, eval.apply(func, vec![value])?))
});

/// The log of `pure x` is the empty list.
const WRITER_PURE: NativeFn = NativeFn::new("Writer.pure", 1, |_, args| {
    let [x] = take::<1>("Writer.pure", args)?;
    Ok(Value::writer(Value::List(Vec::new()), x))
});

/// Runs `f` on the value and appends its log with the `Monoid` of the
/// left log's type. An empty list log, as left by `pure`, is neutral for
/// every log type.
const WRITER_BIND: NativeFn = NativeFn::new("Writer.bind", 2, |eval, args| {
    let [writer, func] = take::<2>("Writer.bind", args)?;
    let (log, value) = writer_parts(eval, writer, "bind")?;
    let result = eval.apply(func, vec![value])?;
    let (next_log, next_value) = writer_parts(eval, result, "bind on Writer result")?;
    let log = eval.force(log)?;
    let next_log = eval.force(next_log)?;
    let combined = if is_empty_list(&log) {
        next_log
    } else if is_empty_list(&next_log) {
        log
    } else {
        eval.call_method(MONOID, "mappend", None, vec![log, next_log])?
    };
    Ok(Value::writer(combined, next_value))
});

fn is_empty_list(value: &Value) -> bool {
    matches!(value, Value::List(items) if items.is_empty())
}

const WRITER_FOLDR: NativeFn = NativeFn::new("Writer.foldr", 3, |eval, args| {
    let [func, seed, writer] = take::<3>("Writer.foldr", args)?;
    let (_, value) = writer_parts(eval, writer, "foldr")?;
    eval.apply(func, vec![value, seed])
});

const WRITER_FOLDL: NativeFn = NativeFn::new("Writer.foldl", 3, |eval, args| {
    let [func, seed, writer] = take::<3>("Writer.foldl", args)?;
    let (_, value) = writer_parts(eval, writer, "foldl")?;
    fold::foldl_strict(eval, func, seed, vec![value])
});

// ══════════════════════════════════════════════════════════════════════════════
// Function
// ══════════════════════════════════════════════════════════════════════════════

/// Mapping over a function composes: `map f g = \x -> f (g x)`.
const FUNCTION_MAP: NativeFn = NativeFn::new("Function.map", 2, |_, args| {
    let [func, inner] = take::<2>("Function.map", args)?;
    Ok(Value::Partial {
        func: Box::new(Value::Native(COMPOSE)),
        args: vec![func, inner],
    })
});

/// `compose f g x = f (g x)`
pub const COMPOSE: NativeFn = NativeFn::new("compose", 3, |eval, args| {
    let [outer, inner, x] = take::<3>("compose", args)?;
    let y = eval.apply(inner, vec![x])?;
    eval.apply(outer, vec![y])
});

// ══════════════════════════════════════════════════════════════════════════════
// Scalar monoids
// ══════════════════════════════════════════════════════════════════════════════

const INT_MEMPTY: NativeFn = NativeFn::new("Int.mempty", 0, |_, _| Ok(Value::Int(0)));

/// Integers combine by addition.
const INT_MAPPEND: NativeFn = NativeFn::new("Int.mappend", 2, |eval, args| {
    let [left, right] = take::<2>("Int.mappend", args)?;
    match (eval.force(left)?, eval.force(right)?) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(b)
            .map(Value::Int)
            .ok_or_else(|| EvalError::ArithmeticTrap("integer overflow in 'mappend'".into())),
        (a, b) => Err(EvalError::TypeMismatch(format!(
            "mappend on Int got {} and {}",
            a.type_tag(),
            b.type_tag()
        ))),
    }
});

const STRING_MEMPTY: NativeFn =
    NativeFn::new("String.mempty", 0, |_, _| Ok(Value::Str(String::new())));

const STRING_MAPPEND: NativeFn = NativeFn::new("String.mappend", 2, |eval, args| {
    let [left, right] = take::<2>("String.mappend", args)?;
    match (eval.force(left)?, eval.force(right)?) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (a, b) => Err(EvalError::TypeMismatch(format!(
            "mappend on String got {} and {}",
            a.type_tag(),
            b.type_tag()
        ))),
    }
});

const UNIT_MEMPTY: NativeFn = NativeFn::new("Unit.mempty", 0, |_, _| Ok(Value::Unit));

const UNIT_MAPPEND: NativeFn = NativeFn::new("Unit.mappend", 2, |_, _| Ok(Value::Unit));
