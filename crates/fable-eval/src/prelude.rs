//! Built-in interfaces, data types and functions.
//!
//! ```text
//! data Maybe a    = Nothing | Just a
//! data Writer w a = Writer w a
//!
//! interface Functor f         { map, replace }
//! interface Monad m : Functor { pure, bind, then, monadMap }
//! interface Foldable t        { foldr, foldl, length, sum, toList }
//! interface Monoid a          { mempty, mappend, mconcat }
//! ```

use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::instances::{self, COMPOSE};
use crate::value::{tags, NativeFn, Value};
use fable_types::ast::{BinOp, DataDecl, Dispatch, Expr, InterfaceDecl};

pub const FUNCTOR: &str = "Functor";
pub const MONAD: &str = "Monad";
pub const FOLDABLE: &str = "Foldable";
pub const MONOID: &str = "Monoid";

/// Inside instance methods and interface defaults, names the instance type.
pub const SELF_TYPE: &str = "Self";

/// Install the prelude into an evaluator.
pub fn install(eval: &mut Evaluator) -> EvalResult<()> {
    for decl in data_types() {
        eval.declare_data(&decl)?;
    }
    for decl in interfaces() {
        eval.declare_interface(decl)?;
    }
    for instance in instances::native_instances() {
        eval.register_native_instance(instance)?;
    }
    for native in BUILTINS {
        eval.define_builtin(native);
    }
    log::debug!(
        "prelude installed: {} instances",
        eval.registry().instance_count()
    );
    Ok(())
}

pub fn data_types() -> Vec<DataDecl> {
    vec![
        DataDecl::new(tags::MAYBE, &["a"])
            .constructor("Nothing", 0)
            .constructor("Just", 1),
        DataDecl::new(tags::WRITER, &["w", "a"]).constructor("Writer", 2),
    ]
}

pub fn interfaces() -> Vec<InterfaceDecl> {
    let var = Expr::var;
    let lambda = Expr::lambda;

    vec![
        InterfaceDecl::new(FUNCTOR)
            .method("map", 2, Dispatch::Arg(1))
            // replace x fa = map (\_ -> x) fa
            .default_method(
                "replace",
                2,
                Dispatch::Arg(1),
                lambda(&["x", "fa"], Expr::map(lambda(&["_"], var("x")), var("fa"))),
            ),
        InterfaceDecl::new(MONAD)
            .extends(FUNCTOR)
            .method("pure", 1, Dispatch::Explicit)
            .method("bind", 2, Dispatch::Arg(0))
            // then m k = bind m (\_ -> k)
            .default_method(
                "then",
                2,
                Dispatch::Arg(0),
                lambda(&["m", "k"], Expr::bind(var("m"), lambda(&["_"], var("k")))),
            )
            // monadMap m f = bind m f
            .default_method(
                "monadMap",
                2,
                Dispatch::Arg(0),
                lambda(&["m", "f"], Expr::bind(var("m"), var("f"))),
            ),
        InterfaceDecl::new(FOLDABLE)
            .method("foldr", 3, Dispatch::Arg(2))
            .method("foldl", 3, Dispatch::Arg(2))
            .default_method(
                "length",
                1,
                Dispatch::Arg(0),
                lambda(
                    &["t"],
                    Expr::foldl(
                        lambda(
                            &["acc", "_"],
                            Expr::binary(BinOp::Add, var("acc"), Expr::int(1)),
                        ),
                        Expr::int(0),
                        var("t"),
                    ),
                ),
            )
            .default_method(
                "sum",
                1,
                Dispatch::Arg(0),
                lambda(
                    &["t"],
                    Expr::foldl(
                        lambda(
                            &["acc", "x"],
                            Expr::binary(BinOp::Add, var("acc"), var("x")),
                        ),
                        Expr::int(0),
                        var("t"),
                    ),
                ),
            )
            .default_method(
                "toList",
                1,
                Dispatch::Arg(0),
                lambda(
                    &["t"],
                    Expr::foldr(
                        lambda(
                            &["x", "acc"],
                            Expr::binary(BinOp::Append, Expr::list(vec![var("x")]), var("acc")),
                        ),
                        Expr::list(Vec::new()),
                        var("t"),
                    ),
                ),
            ),
        InterfaceDecl::new(MONOID)
            .method("mempty", 0, Dispatch::Explicit)
            .method("mappend", 2, Dispatch::Arg(0))
            // mconcat xs = foldr mappend mempty xs
            .default_method(
                "mconcat",
                1,
                Dispatch::Explicit,
                lambda(
                    &["xs"],
                    Expr::foldr(
                        lambda(
                            &["x", "acc"],
                            Expr::method(MONOID, "mappend", vec![var("x"), var("acc")]),
                        ),
                        Expr::method_at(MONOID, "mempty", SELF_TYPE, Vec::new()),
                        var("xs"),
                    ),
                ),
            ),
    ]
}

// ══════════════════════════════════════════════════════════════════════════════
// Built-in functions
// ══════════════════════════════════════════════════════════════════════════════

const BUILTINS: [NativeFn; 5] = [TELL, SHOW, NOT, ID, COMPOSE];

/// `tell w = Writer w ()`
const TELL: NativeFn = NativeFn::new("tell", 1, |_, mut args| {
    let log = args.pop().unwrap_or(Value::Unit);
    Ok(Value::writer(log, Value::Unit))
});

/// Render a fully forced value.
const SHOW: NativeFn = NativeFn::new("show", 1, |eval, mut args| {
    let value = args.pop().unwrap_or(Value::Unit);
    let value = eval.force_deep(value)?;
    Ok(Value::Str(value.to_string()))
});

const NOT: NativeFn = NativeFn::new("not", 1, |eval, mut args| {
    let value = args.pop().unwrap_or(Value::Unit);
    match eval.force(value)? {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        other => Err(EvalError::TypeMismatch(format!(
            "not requires Bool, got {}",
            other.type_tag()
        ))),
    }
});

const ID: NativeFn = NativeFn::new("id", 1, |_, mut args| Ok(args.pop().unwrap_or(Value::Unit)));
