//! Shared types for the Fable evaluator.
//!
//! This crate defines the AST node types, error codes and serializable
//! diagnostics used by the evaluator and by hosts that load programs
//! from JSON.

mod error;
pub mod ast;

pub use error::{Diagnostic, ErrorCategory, ErrorCode};
