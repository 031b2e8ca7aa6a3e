//! Evaluator limits.

use crate::error::EvalResult;
use serde::{Deserialize, Serialize};

/// Resource limits for one evaluation.
///
/// Missing JSON fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Maximum number of expression steps.
    pub gas_limit: u64,
    /// Maximum nesting of closure calls, and of lists and data values.
    ///
    /// A right fold whose function forces its accumulator uses one level
    /// per element, so it is limited to lists of about this length.
    pub max_depth: usize,
}

impl EvalConfig {
    pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;
    pub const DEFAULT_MAX_DEPTH: usize = 200;

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse a configuration from JSON, e.g. `{"gas_limit": 5000}`.
    pub fn from_json(source: &str) -> EvalResult<Self> {
        Ok(serde_json::from_str(source)?)
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            gas_limit: Self::DEFAULT_GAS_LIMIT,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvalError;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EvalConfig::from_json(r#"{"gas_limit": 5000}"#).unwrap();
        assert_eq!(config.gas_limit, 5000);
        assert_eq!(config.max_depth, EvalConfig::DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn malformed_json_is_invalid_input() {
        let err = EvalConfig::from_json("{gas_limit}").unwrap_err();
        assert!(matches!(err, EvalError::InvalidInput(_)));
    }

    #[test]
    fn builder_overrides() {
        let config = EvalConfig::default().with_gas_limit(10).with_max_depth(3);
        assert_eq!(
            config,
            EvalConfig {
                gas_limit: 10,
                max_depth: 3
            }
        );
    }
}
