//! Signal: a value-changed notification from a source.
//!
//! Sources are anything that produces values over time: sensors, GPIO
//! channels, or other actions (whose return values are re-emitted under
//! `action.<id>`).

use serde::{Deserialize, Serialize};

use crate::id::SignalId;
use crate::time::{Timestamp, now};
use crate::value::Value;

/// A new value observed on a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueChanged {
    pub source: SignalId,
    pub value: Value,
    /// The value the source held before, if any was known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Value>,
    pub timestamp: Timestamp,
}

impl ValueChanged {
    /// Record a change observed now.
    #[must_use]
    pub fn new(source: SignalId, value: Value, previous: Option<Value>) -> Self {
        Self {
            source,
            value,
            previous,
            timestamp: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_serialize_without_unknown_previous_value() {
        let change = ValueChanged::new(SignalId::gpio(17), json!(true), None);
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["source"], "gpio.17");
        assert_eq!(json["value"], true);
        assert!(json.get("previous").is_none());
    }
}
