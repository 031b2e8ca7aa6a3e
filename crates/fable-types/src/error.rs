use serde::{Deserialize, Serialize};
use std::fmt;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Dispatch,
    Type,
    Scope,
    Limit,
    Runtime,
}

/// Numeric error code (E100–E599).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Dispatch errors (E100–E199) ──
    pub const NO_INSTANCE: Self = Self(100);
    pub const DUPLICATE_INSTANCE: Self = Self(101);
    pub const MISSING_SUPERINSTANCE: Self = Self(102);
    pub const UNKNOWN_INTERFACE: Self = Self(103);
    pub const DUPLICATE_INTERFACE: Self = Self(104);
    pub const UNKNOWN_METHOD: Self = Self(105);
    pub const MISSING_METHOD: Self = Self(106);

    // ── Type errors (E200–E299) ──
    pub const TYPE_MISMATCH: Self = Self(200);
    pub const NOT_CALLABLE: Self = Self(201);
    pub const CONSTRUCTOR_ARITY: Self = Self(202);
    pub const ARITY_MISMATCH: Self = Self(203);
    pub const NON_EXHAUSTIVE_MATCH: Self = Self(210);

    // ── Scope errors (E300–E399) ──
    pub const UNDEFINED_VARIABLE: Self = Self(300);
    pub const UNKNOWN_CONSTRUCTOR: Self = Self(301);
    pub const DUPLICATE_CONSTRUCTOR: Self = Self(302);

    // ── Limit errors (E400–E499) ──
    pub const GAS_EXHAUSTED: Self = Self(400);
    pub const DEPTH_EXCEEDED: Self = Self(401);

    // ── Runtime errors (E500–E599) ──
    pub const ARITHMETIC_TRAP: Self = Self(500);
    pub const CYCLIC_THUNK: Self = Self(501);
    pub const INVALID_INPUT: Self = Self(502);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Dispatch,
            200..=299 => ErrorCategory::Type,
            300..=399 => ErrorCategory::Scope,
            400..=499 => ErrorCategory::Limit,
            _ => ErrorCategory::Runtime,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatch => write!(f, "dispatch"),
            Self::Type => write!(f, "type"),
            Self::Scope => write!(f, "scope"),
            Self::Limit => write!(f, "limit"),
            Self::Runtime => write!(f, "runtime"),
        }
    }
}

/// A structured evaluation diagnostic.
///
/// Hosts render these as JSON; they must not parse the free-form message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Error code (e.g., E100).
    pub code: ErrorCode,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// Optional fix suggestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            category: code.category(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Attach a fix suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"message\":{:?}}}", self.message))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.code, self.category, self.message)
    }
}

impl std::error::Error for Diagnostic {}
