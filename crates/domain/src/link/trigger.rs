//! Trigger: the predicate a link evaluates against each new value.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::{Value, as_number, is_truthy, loosely_equal};

/// A boolean-valued function of the new value.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    #[must_use]
    pub fn test(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// When a link fires.
///
/// Function predicates only exist in code; the other variants can come from
/// configuration files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Any truthy value.
    Truthy,
    /// Any falsy value.
    Falsy,
    /// A literal value (numbers compare numerically).
    Equals(Value),
    /// A number strictly greater than the threshold.
    Above(f64),
    /// A number strictly less than the threshold.
    Below(f64),
    /// An arbitrary function of the value.
    #[serde(skip)]
    Predicate(Predicate),
}

impl Trigger {
    /// Trigger on a function of the new value.
    pub fn when(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Predicate::new(f))
    }

    /// Trigger on a literal value.
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::Equals(value.into())
    }

    /// Whether `value` satisfies this trigger.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Truthy => is_truthy(value),
            Self::Falsy => !is_truthy(value),
            Self::Equals(expected) => loosely_equal(expected, value),
            Self::Above(threshold) => as_number(value).is_some_and(|n| n > *threshold),
            Self::Below(threshold) => as_number(value).is_some_and(|n| n < *threshold),
            Self::Predicate(predicate) => predicate.test(value),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truthy => f.write_str("truthy"),
            Self::Falsy => f.write_str("falsy"),
            Self::Equals(value) => write!(f, "== {value}"),
            Self::Above(threshold) => write!(f, "> {threshold}"),
            Self::Below(threshold) => write!(f, "< {threshold}"),
            Self::Predicate(_) => f.write_str("predicate"),
        }
    }
}
