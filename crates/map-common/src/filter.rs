//! Boolean filters over features, used to gate style rules.

use serde::{Deserialize, Serialize};

use crate::expr::Expression;
use crate::feature::{AttributeValue, Feature};

/// Comparison operator for [`Filter::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A boolean predicate over a feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Compare {
        left: Expression,
        op: CompareOp,
        right: Expression,
    },
    Not(Box<Filter>),
    AllOf(Vec<Filter>),
    AnyOf(Vec<Filter>),
}

impl Filter {
    /// Evaluate the filter. Comparisons against null (absent attribute)
    /// are false except `Ne`, which treats "not present" as "not equal".
    pub fn evaluate(&self, feature: &Feature) -> bool {
        match self {
            Filter::Compare { left, op, right } => {
                compare(&left.evaluate(feature), *op, &right.evaluate(feature))
            }
            Filter::Not(inner) => !inner.evaluate(feature),
            Filter::AllOf(filters) => filters.iter().all(|f| f.evaluate(feature)),
            Filter::AnyOf(filters) => filters.iter().any(|f| f.evaluate(feature)),
        }
    }

    /// Convenience constructor for the common attribute-vs-literal case.
    pub fn compare(attribute: &str, op: CompareOp, value: impl Into<Expression>) -> Self {
        Filter::Compare {
            left: Expression::Attribute(attribute.to_string()),
            op,
            right: value.into(),
        }
    }
}

fn compare(left: &AttributeValue, op: CompareOp, right: &AttributeValue) -> bool {
    if left.is_null() || right.is_null() {
        return matches!(op, CompareOp::Ne);
    }

    // Numeric comparison when both sides coerce, else string comparison.
    let ordering = match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => match (left.as_text(), right.as_text()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => None,
        },
    };

    let Some(ordering) = ordering else {
        return false;
    };

    match op {
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Ne => ordering.is_ne(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Le => ordering.is_le(),
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Ge => ordering.is_ge(),
    }
}
