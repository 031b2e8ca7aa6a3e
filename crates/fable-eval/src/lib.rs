//! Fable tree-walking evaluator.
//!
//! Evaluates Fable programs directly from the AST. Algebraic data types
//! (`Maybe`, `Writer`, user declarations) and native lists dispatch
//! `map`, `bind`, `pure` and the folds through an instance registry keyed
//! by `(type tag, interface)`.
//!
//! ```
//! use fable_eval::{run_program, EvalConfig, Value};
//! use fable_types::ast::{BinOp, Expr, Program};
//!
//! let double = Expr::lambda(&["x"], Expr::binary(BinOp::Mul, Expr::var("x"), Expr::int(2)));
//! let program = Program::new(Expr::map(double, Expr::construct("Just", vec![Expr::int(21)])));
//! let result = run_program(&program, EvalConfig::default()).unwrap();
//! assert_eq!(result, Value::just(Value::Int(42)));
//! ```

mod config;
mod env;
mod error;
mod evaluator;
pub mod fold;
pub mod instances;
pub mod prelude;
mod registry;
mod value;

pub use config::EvalConfig;
pub use env::Environment;
pub use error::{EvalError, EvalResult};
pub use evaluator::{run_program, run_program_json, EvalStats, Evaluator};
pub use registry::{Implementation, Instance, InstanceRegistry, Resolution};
pub use value::{tags, Closure, NativeFn, NativeImpl, Suspended, Thunk, Value};
