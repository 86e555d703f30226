//! Template expressions
//!
//! The evaluator shipped with the daemon. An expression is plain text with
//! placeholders:
//!
//! - `%{ifname}`: the interface the expression is evaluated for
//! - `%{/json/pointer}`: a value looked up in the live state document
//!
//! A placeholder contributes zero values when its lookup finds nothing,
//! one value for a scalar, and one value per element for an array. The
//! results are every combination of placeholder values, in order, so an
//! expression referring to a missing value evaluates to nothing at all.
//!
//! ```rust
//! use ifgate_core::expression::TemplateEvaluator;
//! use ifgate_core::traits::{Expression, ExpressionEvaluator};
//!
//! let state = serde_json::json!({ "servers": ["ns1", "ns2"] });
//! let results = TemplateEvaluator::new()
//!     .evaluate(&Expression::from("%{ifname}:%{/servers}"), "eth0", &state)
//!     .unwrap();
//! assert_eq!(results, vec!["eth0:ns1", "eth0:ns2"]);
//! ```

use serde_json::Value;

use crate::Error;
use crate::traits::{Expression, ExpressionEvaluator, LiveState};

const IFNAME: &str = "ifname";

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn parse(text: &str) -> Result<Vec<Segment<'_>>, String> {
    let mut segments = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("%{") {
        if start > 0 {
            segments.push(Segment::Literal(&rest[..start]));
        }
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| format!("unterminated placeholder in \"{}\"", text))?;
        segments.push(Segment::Placeholder(&after[..end]));
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

fn scalar(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) | Value::Object(_) => Err("value is not a scalar".to_string()),
    }
}

/// Evaluator for `%{...}` template expressions
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEvaluator;

impl TemplateEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn values(&self, name: &str, interface: &str, state: &LiveState) -> Result<Vec<String>, String> {
        if name == IFNAME {
            return Ok(vec![interface.to_string()]);
        }
        if !name.starts_with('/') {
            return Err(format!("unknown placeholder %{{{}}}", name));
        }

        match state.pointer(name) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(value) = scalar(item).map_err(|e| format!("{}: {}", name, e))? {
                        values.push(value);
                    }
                }
                Ok(values)
            }
            Some(value) => Ok(scalar(value)
                .map_err(|e| format!("{}: {}", name, e))?
                .into_iter()
                .collect()),
        }
    }
}

impl ExpressionEvaluator for TemplateEvaluator {
    fn evaluate(
        &self,
        expression: &Expression,
        interface: &str,
        state: &LiveState,
    ) -> Result<Vec<String>, Error> {
        let fail = |message: String| Error::evaluation(expression.as_str(), message);

        let mut results = vec![String::new()];
        for segment in parse(expression.as_str()).map_err(fail)? {
            match segment {
                Segment::Literal(text) => results.iter_mut().for_each(|r| r.push_str(text)),
                Segment::Placeholder(name) => {
                    let values = self.values(name, interface, state).map_err(fail)?;
                    results = results
                        .iter()
                        .flat_map(|prefix| values.iter().map(move |v| format!("{}{}", prefix, v)))
                        .collect();
                }
            }
        }
        Ok(results)
    }
}
