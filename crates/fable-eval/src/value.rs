//! Runtime values.

use crate::env::Environment;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use fable_types::ast::Expr;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Type tags for the built-in value kinds. Data values use their type name.
pub mod tags {
    pub const INT: &str = "Int";
    pub const BOOL: &str = "Bool";
    pub const STRING: &str = "String";
    pub const UNIT: &str = "Unit";
    pub const LIST: &str = "List";
    pub const FUNCTION: &str = "Function";
    pub const MAYBE: &str = "Maybe";
    pub const WRITER: &str = "Writer";
}

/// A Fable runtime value.
#[derive(Clone)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
    Unit,
    List(Vec<Value>),
    /// A constructed algebraic data value, e.g. `Just 3`.
    Data {
        type_name: String,
        constructor: String,
        fields: Vec<Value>,
    },
    /// A data constructor used as a function, e.g. `map Just xs`.
    Constructor {
        type_name: String,
        constructor: String,
        arity: usize,
    },
    Closure(Rc<Closure>),
    /// A function applied to fewer arguments than it takes.
    Partial { func: Box<Value>, args: Vec<Value> },
    Native(NativeFn),
    Thunk(Thunk),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// Build a data value.
    pub fn data(type_name: &str, constructor: &str, fields: Vec<Value>) -> Self {
        Self::Data {
            type_name: type_name.to_string(),
            constructor: constructor.to_string(),
            fields,
        }
    }

    pub fn just(value: Value) -> Self {
        Self::data(tags::MAYBE, "Just", vec![value])
    }

    pub fn nothing() -> Self {
        Self::data(tags::MAYBE, "Nothing", vec![])
    }

    pub fn writer(log: Value, value: Value) -> Self {
        Self::data(tags::WRITER, "Writer", vec![log, value])
    }

    pub fn ints(items: &[i64]) -> Self {
        Self::List(items.iter().map(|n| Self::Int(*n)).collect())
    }

    /// The key used for interface dispatch.
    ///
    /// An unforced thunk has no tag of its own; callers force first.
    pub fn type_tag(&self) -> &str {
        match self {
            Self::Int(_) => tags::INT,
            Self::Bool(_) => tags::BOOL,
            Self::Str(_) => tags::STRING,
            Self::Unit => tags::UNIT,
            Self::List(_) => tags::LIST,
            Self::Data { type_name, .. } => type_name,
            Self::Constructor { .. }
            | Self::Closure(_)
            | Self::Partial { .. }
            | Self::Native(_) => tags::FUNCTION,
            Self::Thunk(_) => "Thunk",
        }
    }

    /// Deep structural equality. Functions never compare equal.
    /// Thunks compare by their memoized value, unforced thunks never match.
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Thunk(t), _) => t.forced().is_some_and(|v| v.structural_eq(other)),
            (_, Self::Thunk(t)) => t.forced().is_some_and(|v| self.structural_eq(&v)),
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Unit, Self::Unit) => true,
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structural_eq(y))
            }
            (
                Self::Data {
                    type_name: ta,
                    constructor: ca,
                    fields: fa,
                },
                Self::Data {
                    type_name: tb,
                    constructor: cb,
                    fields: fb,
                },
            ) => {
                ta == tb
                    && ca == cb
                    && fa.len() == fb.len()
                    && fa.iter().zip(fb).all(|(x, y)| x.structural_eq(y))
            }
            _ => false,
        }
    }

    /// Nesting depth of lists and data, looking through forced thunks.
    /// Stops counting once `limit + 1` levels have been seen.
    pub fn nesting(&self, limit: usize) -> usize {
        let children = match self {
            Self::List(items) => items,
            Self::Data { fields, .. } => fields,
            Self::Thunk(t) => {
                return match t.0.try_borrow().as_deref() {
                    Ok(ThunkState::Done(v)) => v.nesting(limit),
                    _ => 0,
                }
            }
            _ => return 0,
        };
        if limit == 0 {
            return 1;
        }
        1 + children
            .iter()
            .map(|child| child.nesting(limit - 1))
            .max()
            .unwrap_or(0)
    }

    fn needs_parens(&self) -> bool {
        match self {
            Self::Data { fields, .. } => !fields.is_empty(),
            Self::Int(n) => *n < 0,
            Self::Thunk(t) => t.forced().is_some_and(|v| v.needs_parens()),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Unit => write!(f, "()"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Data {
                constructor,
                fields,
                ..
            } => {
                write!(f, "{constructor}")?;
                for field in fields {
                    if field.needs_parens() {
                        write!(f, " ({field})")?;
                    } else {
                        write!(f, " {field}")?;
                    }
                }
                Ok(())
            }
            Self::Constructor { constructor, .. } => write!(f, "<constructor {constructor}>"),
            Self::Closure(_) | Self::Partial { .. } => write!(f, "<function>"),
            Self::Native(native) => write!(f, "<native {}>", native.name),
            Self::Thunk(t) => match t.forced() {
                Some(v) => write!(f, "{v}"),
                None => write!(f, "<thunk>"),
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "Int({n})"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Unit => write!(f, "Unit"),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Data {
                type_name,
                constructor,
                fields,
            } => f
                .debug_struct("Data")
                .field("type_name", type_name)
                .field("constructor", constructor)
                .field("fields", fields)
                .finish(),
            Self::Constructor { constructor, .. } => write!(f, "Constructor({constructor})"),
            Self::Closure(c) => write!(f, "Closure({:?})", c.params),
            Self::Partial { func, args } => f
                .debug_struct("Partial")
                .field("func", func)
                .field("args", args)
                .finish(),
            Self::Native(native) => write!(f, "Native({})", native.name),
            Self::Thunk(t) => match t.forced() {
                Some(v) => write!(f, "Thunk({v:?})"),
                None => write!(f, "Thunk(<pending>)"),
            },
        }
    }
}

/// A lambda together with the environment it was created in.
pub struct Closure {
    pub params: Vec<String>,
    pub body: Expr,
    pub env: Environment,
}

/// Signature of built-in functions and native instance methods.
pub type NativeImpl = fn(&mut Evaluator, Vec<Value>) -> EvalResult<Value>;

/// A function implemented in Rust.
#[derive(Clone, Copy)]
pub struct NativeFn {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeImpl,
}

impl NativeFn {
    pub const fn new(name: &'static str, arity: usize, func: NativeImpl) -> Self {
        Self { name, arity, func }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({}/{})", self.name, self.arity)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Thunks
// ══════════════════════════════════════════════════════════════════════════════

/// A suspended computation.
#[derive(Clone)]
pub enum Suspended {
    /// Evaluate an expression in a captured environment.
    Expr { expr: Rc<Expr>, env: Environment },
    /// The remainder of a right fold: `foldr func seed items[start..]`.
    FoldRight {
        func: Value,
        seed: Value,
        items: Rc<[Value]>,
        start: usize,
    },
}

pub(crate) enum ThunkState {
    Pending(Suspended),
    /// Being forced right now; forcing again is a cycle.
    Forcing,
    Done(Value),
    Failed(EvalError),
}

/// A memoized, shared suspended computation.
#[derive(Clone)]
pub struct Thunk(pub(crate) Rc<RefCell<ThunkState>>);

impl Thunk {
    pub fn new(suspended: Suspended) -> Self {
        Self(Rc::new(RefCell::new(ThunkState::Pending(suspended))))
    }

    /// The memoized value, if the thunk has been forced successfully.
    pub fn forced(&self) -> Option<Value> {
        match &*self.0.borrow() {
            ThunkState::Done(v) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(&*self.0.borrow(), ThunkState::Done(_))
    }
}
