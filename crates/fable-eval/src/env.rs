//! Scoped variable environment for the Fable evaluator.

use crate::value::Value;
use std::collections::BTreeMap;

/// A single scope level.
#[derive(Debug, Clone, Default)]
struct Scope {
    bindings: BTreeMap<String, Value>,
}

/// Scoped variable environment with push/pop semantics.
///
/// Variables are looked up from innermost scope outward.
/// `define` always creates in the current (innermost) scope, shadowing
/// any outer binding of the same name. Closures capture a clone of the
/// environment they are created in.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    /// Create a new environment with one root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// Push a new scope (for lambda bodies, `let`, match arms).
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost scope. The root scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Define a variable in the current (innermost) scope.
    pub fn define(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name.to_string(), value);
        }
    }

    /// Look up a variable, searching from innermost to outermost scope.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(name))
    }

    /// Number of scope levels, root included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut env = Environment::new();
        env.define("x", Value::Int(1));
        env.push_scope();
        env.define("x", Value::Int(2));
        assert_eq!(env.get("x"), Some(&Value::Int(2)));
        env.pop_scope();
        assert_eq!(env.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn root_scope_is_never_popped() {
        let mut env = Environment::new();
        env.define("x", Value::Unit);
        env.pop_scope();
        env.pop_scope();
        assert_eq!(env.depth(), 1);
        assert_eq!(env.get("x"), Some(&Value::Unit));
    }

    #[test]
    fn lookup_misses_return_none() {
        let env = Environment::new();
        assert!(env.get("missing").is_none());
    }
}
