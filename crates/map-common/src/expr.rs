//! Style expressions evaluated per feature.
//!
//! Visual parameters in the style model (colours, sizes, rotations, labels)
//! are expressions, not baked constants: a literal, or a feature attribute
//! looked up at render time. This is what lets one symbolizer instance vary
//! feature to feature.

use serde::{Deserialize, Serialize};

use crate::feature::{AttributeValue, Feature};

/// A style expression: a literal value or an attribute reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Number(f64),
    Text(String),
    Boolean(bool),
    /// Named feature attribute, looked up at evaluation time.
    Attribute(String),
}

impl Expression {
    /// Evaluate against a feature. An attribute that is absent on the
    /// feature evaluates to `Null` (the symbolizer decides whether null is
    /// acceptable), matching the "missing label means nothing drawn"
    /// semantics.
    pub fn evaluate(&self, feature: &Feature) -> AttributeValue {
        match self {
            Expression::Number(n) => AttributeValue::Number(*n),
            Expression::Text(s) => AttributeValue::Text(s.clone()),
            Expression::Boolean(b) => AttributeValue::Boolean(*b),
            Expression::Attribute(name) => feature
                .attribute(name)
                .map(|v| v.clone())
                .unwrap_or(AttributeValue::Null),
        }
    }

    /// Evaluate as a number, `None` when the value does not coerce.
    pub fn number(&self, feature: &Feature) -> Option<f64> {
        self.evaluate(feature).as_f64()
    }

    /// Evaluate as a number with a fallback for null/absent/non-numeric.
    pub fn number_or(&self, feature: &Feature, default: f64) -> f64 {
        self.number(feature).unwrap_or(default)
    }

    /// Evaluate as text, `None` when the value is null or not textual.
    pub fn text(&self, feature: &Feature) -> Option<String> {
        self.evaluate(feature).as_text()
    }
}

impl Default for Expression {
    fn default() -> Self {
        Expression::Number(0.0)
    }
}

impl From<f64> for Expression {
    fn from(n: f64) -> Self {
        Expression::Number(n)
    }
}

impl From<&str> for Expression {
    fn from(s: &str) -> Self {
        Expression::Text(s.to_string())
    }
}
