//! Runtime error types for the Fable evaluator.

use fable_types::{Diagnostic, ErrorCode};
use thiserror::Error;

/// Evaluation error: dispatch failures, runtime traps, limit violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    /// Operand or scrutinee of the wrong shape.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// No `(type tag, interface)` instance is registered.
    #[error("no instance of '{interface}' for type '{type_tag}'")]
    NoInstance { interface: String, type_tag: String },

    #[error("duplicate instance of '{interface}' for type '{type_tag}'")]
    DuplicateInstance { interface: String, type_tag: String },

    /// e.g. a `Monad` instance registered before the `Functor` instance.
    #[error(
        "instance of '{interface}' for type '{type_tag}' requires an instance of '{superinterface}'"
    )]
    MissingSuperinstance {
        interface: String,
        superinterface: String,
        type_tag: String,
    },

    #[error("unknown interface: {0}")]
    UnknownInterface(String),

    #[error("duplicate interface: {0}")]
    DuplicateInterface(String),

    #[error("interface '{interface}' has no method '{method}'")]
    UnknownMethod { interface: String, method: String },

    /// The instance omits a method that has no default.
    #[error("instance of '{interface}' for type '{type_tag}' is missing method '{method}'")]
    MissingMethod {
        interface: String,
        type_tag: String,
        method: String,
    },

    #[error("unknown constructor: {0}")]
    UnknownConstructor(String),

    #[error("duplicate constructor: {0}")]
    DuplicateConstructor(String),

    #[error("constructor '{constructor}' expects {expected} fields, got {found}")]
    ConstructorArity {
        constructor: String,
        expected: usize,
        found: usize,
    },

    #[error("'{name}' expects {expected} arguments, got {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("non-exhaustive match on {0}")]
    NonExhaustiveMatch(String),

    #[error("value of type '{0}' is not callable")]
    NotCallable(String),

    /// Division by zero, integer overflow.
    #[error("arithmetic trap: {0}")]
    ArithmeticTrap(String),

    /// A thunk was forced while it was already being forced.
    #[error("cyclic thunk: value depends on itself")]
    CyclicThunk,

    #[error("gas exhausted after {0} steps")]
    GasExhausted(u64),

    #[error("call depth exceeded limit of {0}")]
    DepthExceeded(usize),

    /// Malformed program or configuration JSON.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl EvalError {
    /// The numeric code reported in diagnostics.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NoInstance { .. } => ErrorCode::NO_INSTANCE,
            Self::DuplicateInstance { .. } => ErrorCode::DUPLICATE_INSTANCE,
            Self::MissingSuperinstance { .. } => ErrorCode::MISSING_SUPERINSTANCE,
            Self::UnknownInterface(_) => ErrorCode::UNKNOWN_INTERFACE,
            Self::DuplicateInterface(_) => ErrorCode::DUPLICATE_INTERFACE,
            Self::UnknownMethod { .. } => ErrorCode::UNKNOWN_METHOD,
            Self::MissingMethod { .. } => ErrorCode::MISSING_METHOD,
            Self::TypeMismatch(_) => ErrorCode::TYPE_MISMATCH,
            Self::NotCallable(_) => ErrorCode::NOT_CALLABLE,
            Self::ConstructorArity { .. } => ErrorCode::CONSTRUCTOR_ARITY,
            Self::ArityMismatch { .. } => ErrorCode::ARITY_MISMATCH,
            Self::NonExhaustiveMatch(_) => ErrorCode::NON_EXHAUSTIVE_MATCH,
            Self::UndefinedVariable(_) => ErrorCode::UNDEFINED_VARIABLE,
            Self::UnknownConstructor(_) => ErrorCode::UNKNOWN_CONSTRUCTOR,
            Self::DuplicateConstructor(_) => ErrorCode::DUPLICATE_CONSTRUCTOR,
            Self::GasExhausted(_) => ErrorCode::GAS_EXHAUSTED,
            Self::DepthExceeded(_) => ErrorCode::DEPTH_EXCEEDED,
            Self::ArithmeticTrap(_) => ErrorCode::ARITHMETIC_TRAP,
            Self::CyclicThunk => ErrorCode::CYCLIC_THUNK,
            Self::InvalidInput(_) => ErrorCode::INVALID_INPUT,
        }
    }

    /// Structured form for hosts.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::new(self.code(), self.to_string());
        match self {
            Self::MissingSuperinstance {
                superinterface,
                type_tag,
                ..
            } => diag.with_suggestion(format!(
                "register an instance of '{superinterface}' for '{type_tag}' first"
            )),
            Self::GasExhausted(_) => diag.with_suggestion("raise gas_limit in EvalConfig"),
            Self::DepthExceeded(_) => diag.with_suggestion("raise max_depth in EvalConfig"),
            _ => diag,
        }
    }
}

impl From<serde_json::Error> for EvalError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
