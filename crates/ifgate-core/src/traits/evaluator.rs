//! Expression evaluation against the live state document
//!
//! Extension descriptors carry expressions (pid file, start/stop command,
//! environment entries) that are only meaningful once the interface is
//! known. They are evaluated at invocation time, never at load time.
//!
//! The core relies on a single property of the evaluator: it returns an
//! ordered sequence of zero or more strings. Callers enforce the
//! cardinality they need.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The in-memory document describing current interface facts
pub type LiveState = serde_json::Value;

/// An unevaluated expression, kept verbatim from configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expression(String);

impl Expression {
    /// Wrap expression text
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Expression source text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Expression {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Trait for expression evaluators
///
/// Evaluation is synchronous and side-effect free; it only reads `state`.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate `expression` for `interface` against `state`
    ///
    /// # Returns
    ///
    /// - `Ok(results)`: Zero or more strings, in evaluation order
    /// - `Err(Error)`: The expression could not be evaluated at all
    fn evaluate(
        &self,
        expression: &Expression,
        interface: &str,
        state: &LiveState,
    ) -> Result<Vec<String>, crate::Error>;
}
