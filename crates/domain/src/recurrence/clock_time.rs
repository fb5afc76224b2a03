//! Clock anchors: `HH:MM[:SS]` within a day, `:MM[:SS]` within an hour.

use std::fmt;
use std::str::FromStr;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::LocalTime;

/// A point on the clock face, either within every day or within every hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: Option<u32>,
    minute: u32,
    second: u32,
}

impl ClockTime {
    /// A time of day.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidClockTime`] if a component is out of range.
    pub fn daily(hour: u32, minute: u32, second: u32) -> Result<Self, ValidationError> {
        Self::checked(Some(hour), minute, second)
    }

    /// A position within every hour.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidClockTime`] if a component is out of range.
    pub fn hourly(minute: u32, second: u32) -> Result<Self, ValidationError> {
        Self::checked(None, minute, second)
    }

    fn checked(hour: Option<u32>, minute: u32, second: u32) -> Result<Self, ValidationError> {
        let anchor = Self {
            hour,
            minute,
            second,
        };
        if hour.is_some_and(|h| h > 23) || minute > 59 || second > 59 {
            return Err(ValidationError::InvalidClockTime(anchor.to_string()));
        }
        Ok(anchor)
    }

    /// Whether this anchor names a time of day (`HH:MM`) rather than a
    /// position within the hour (`:MM`).
    #[must_use]
    pub fn is_daily(&self) -> bool {
        self.hour.is_some()
    }

    #[must_use]
    pub fn hour(&self) -> Option<u32> {
        self.hour
    }

    #[must_use]
    pub fn minute(&self) -> u32 {
        self.minute
    }

    #[must_use]
    pub fn second(&self) -> u32 {
        self.second
    }

    /// Seconds since the start of the anchor's scope (day or hour).
    fn offset(&self) -> u32 {
        self.hour.unwrap_or(0) * 3600 + self.minute * 60 + self.second
    }

    /// Seconds since the start of the same scope for `t`.
    fn offset_of(&self, t: LocalTime) -> u32 {
        let within_hour = t.minute() * 60 + t.second();
        if self.is_daily() {
            t.hour() * 3600 + within_hour
        } else {
            within_hour
        }
    }

    /// Whether `t` lies in `[self, end)`, wrapping past the end of the scope
    /// when `self > end`. An empty window (`self == end`) contains nothing.
    #[must_use]
    pub fn window_contains(&self, end: &ClockTime, t: LocalTime) -> bool {
        let start = self.offset();
        let stop = end.offset();
        let now = self.offset_of(t);
        if start <= stop {
            start <= now && now < stop
        } else {
            now >= start || now < stop
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(hour) = self.hour {
            write!(f, "{hour:02}")?;
        }
        write!(f, ":{:02}", self.minute)?;
        if self.second != 0 {
            write!(f, ":{:02}", self.second)?;
        }
        Ok(())
    }
}

impl FromStr for ClockTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidClockTime(s.to_string());
        let parse = |part: &str| -> Result<u32, ValidationError> {
            if part.len() != 2 {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        let parts: Vec<&str> = s.split(':').collect();
        let (hour, rest) = match parts.as_slice() {
            ["", rest @ ..] => (None, rest),
            [hour, rest @ ..] => (Some(parse(hour)?), rest),
            [] => return Err(invalid()),
        };
        let (minute, second) = match rest {
            [minute] => (parse(minute)?, 0),
            [minute, second] => (parse(minute)?, parse(second)?),
            _ => return Err(invalid()),
        };
        Self::checked(hour, minute, second).map_err(|_| invalid())
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(anchor: ClockTime) -> Self {
        anchor.to_string()
    }
}
