//! Typed identifiers.
//!
//! Two families live here:
//! - **names** ([`ActionId`], [`SignalId`]): human-chosen dotted strings such
//!   as `led.blink` or `sensor.temperature`, validated on construction;
//! - **handles** ([`InvocationId`], [`LinkId`], [`ScheduleId`]): random UUIDs
//!   minted by the runtime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

macro_rules! define_name {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap `value`.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError`] if `value` is empty or is not a
            /// dotted name made of `[A-Za-z0-9_-]` segments.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                validate_name(&value)?;
                Ok(Self(value))
            }

            /// Borrow the identifier text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_name!(
    /// Identifier of an action, unique within a registry (e.g. `led.blink`).
    ActionId
);

define_name!(
    /// Identifier of a value-changed signal source (e.g. `gpio.17`).
    SignalId
);

define_id!(
    /// Identifier of a single run of an action.
    InvocationId
);

define_id!(
    /// Identifier of a link between a signal source and an action.
    LinkId
);

define_id!(
    /// Identifier of a schedule bound to an action.
    ScheduleId
);

impl ActionId {
    /// Derive an identifier from a work function name and its optional
    /// owning controller: `controller.function`, or just `function`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the resulting name is invalid.
    pub fn derive(controller: Option<&str>, function: &str) -> Result<Self, ValidationError> {
        match controller {
            Some(controller) => Self::new(format!("{controller}.{function}")),
            None => Self::new(function),
        }
    }
}

impl SignalId {
    /// Signal carrying a named sensor's readings: `sensor.<name>`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if `name` is not a valid segment.
    pub fn sensor(name: &str) -> Result<Self, ValidationError> {
        Self::new(format!("sensor.{name}"))
    }

    /// Signal carrying a GPIO channel's level: `gpio.<pin>`.
    #[must_use]
    pub fn gpio(pin: u8) -> Self {
        Self(format!("gpio.{pin}"))
    }

    /// Signal carrying the return values of an action: `action.<id>`.
    #[must_use]
    pub fn action(id: &ActionId) -> Self {
        Self(format!("action.{id}"))
    }
}

fn validate_name(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::EmptyIdentifier);
    }
    let valid_segments = value.split('.').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    });
    if valid_segments {
        Ok(())
    } else {
        Err(ValidationError::InvalidIdentifier(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_unique_ids_when_called_twice() {
        let a = InvocationId::new();
        let b = InvocationId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn should_roundtrip_uuid_id_through_display_and_from_str() {
        let id = LinkId::new();
        let parsed: LinkId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn should_accept_dotted_action_id() {
        let id = ActionId::new("garden.water_plants").unwrap();
        assert_eq!(id.as_str(), "garden.water_plants");
    }

    #[test]
    fn should_reject_empty_action_id() {
        assert_eq!(ActionId::new(""), Err(ValidationError::EmptyIdentifier));
    }

    #[test]
    fn should_reject_action_id_with_spaces_or_empty_segments() {
        assert!(ActionId::new("led blink").is_err());
        assert!(ActionId::new("led..blink").is_err());
        assert!(ActionId::new(".blink").is_err());
        assert!(ActionId::new("blink.").is_err());
    }

    #[test]
    fn should_derive_action_id_from_controller_and_function() {
        let id = ActionId::derive(Some("led"), "blink").unwrap();
        assert_eq!(id.as_str(), "led.blink");
    }

    #[test]
    fn should_derive_action_id_from_bare_function() {
        let id = ActionId::derive(None, "app_main").unwrap();
        assert_eq!(id.as_str(), "app_main");
    }

    #[test]
    fn should_build_well_known_signal_ids() {
        assert_eq!(SignalId::gpio(17).as_str(), "gpio.17");
        assert_eq!(
            SignalId::sensor("temperature").unwrap().as_str(),
            "sensor.temperature"
        );
        let action = ActionId::new("fan.run").unwrap();
        assert_eq!(SignalId::action(&action).as_str(), "action.fan.run");
    }

    #[test]
    fn should_serialize_names_as_plain_strings() {
        let id = ActionId::new("led.blink").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"led.blink\"");
        let parsed: ActionId = serde_json::from_str("\"led.blink\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn should_reject_invalid_name_when_deserializing() {
        let result = serde_json::from_str::<SignalId>("\"bad id\"");
        assert!(result.is_err());
    }
}
