//! Recurrence: the time rule a schedule fires on.
//!
//! Marks are aligned to the wall clock, not to when the schedule was
//! created: "every 10 minutes" is due at `:00`, `:10`, `:20`, … of every
//! hour. An optional window (`at X until Y`) restricts the marks to `[X, Y)`.
//!
//! Counting restarts with every cycle: minute and hour marks count from
//! midnight, week marks from ISO week numbers. An interval that does not
//! divide its cycle leaves a shorter gap at the wrap: `every(7).minutes()`
//! fires at 23:55 and again at 00:00, `every(5).hours()` at 20:00 and then
//! 00:00, and `every(2).on(..)` fires in week 52 and then week 2 of a year
//! with 53 weeks. Day marks count from a fixed epoch and never wrap.

mod clock_time;

pub use clock_time::ClockTime;

use std::fmt;

use chrono::{Datelike, Duration, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::{LocalTime, truncate_to_second};

/// The calendar unit a recurrence counts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Minute,
    Hour,
    Day,
    Weekday(Weekday),
}

/// A validated recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    unit: Unit,
    interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    at: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    until: Option<ClockTime>,
}

impl Recurrence {
    /// Start a rule that repeats every `interval` units.
    #[must_use]
    pub fn every(interval: u32) -> RecurrenceBuilder {
        RecurrenceBuilder {
            interval,
            ..RecurrenceBuilder::default()
        }
    }

    #[must_use]
    pub fn unit(&self) -> Unit {
        self.unit
    }

    #[must_use]
    pub fn interval(&self) -> u32 {
        self.interval
    }

    #[must_use]
    pub fn at(&self) -> Option<ClockTime> {
        self.at
    }

    #[must_use]
    pub fn until(&self) -> Option<ClockTime> {
        self.until
    }

    /// Check the rule's invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when:
    /// - `interval` is zero
    /// - `until` is given without `at`, or with an anchor of another shape
    /// - a minute rule has a bare `at` (minutes only take a window)
    /// - an hour rule has a time-of-day `at`, or a day rule a `:MM` one
    /// - a window is given to a day or weekday rule, or contains none of the
    ///   rule's marks
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.interval == 0 {
            return Err(ValidationError::ZeroInterval);
        }
        self.validate_anchors()?;
        if self.at.is_some() && self.until.is_some() {
            self.validate_window()?;
        }
        Ok(())
    }

    fn validate_anchors(&self) -> Result<(), ValidationError> {
        match (self.at, self.until) {
            (None, Some(_)) => Err(ValidationError::InvalidRecurrence(
                "`until` requires an `at` window start",
            )),
            (Some(start), Some(end)) if start.is_daily() != end.is_daily() => Err(
                ValidationError::InvalidRecurrence("window anchors must have the same shape"),
            ),
            (Some(anchor), None) => match self.unit {
                Unit::Minute => Err(ValidationError::InvalidRecurrence(
                    "minute rules accept `at` only together with `until`",
                )),
                Unit::Hour if anchor.is_daily() => Err(ValidationError::InvalidRecurrence(
                    "hourly anchors must be `:MM[:SS]`",
                )),
                Unit::Day | Unit::Weekday(_) if !anchor.is_daily() => Err(
                    ValidationError::InvalidRecurrence("daily anchors must be `HH:MM[:SS]`"),
                ),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Windows hold minute or hour marks only, and at least one of them.
    /// Those marks depend on the time of day alone, so one day is enough.
    fn validate_window(&self) -> Result<(), ValidationError> {
        if matches!(self.unit, Unit::Day | Unit::Weekday(_)) {
            return Err(ValidationError::InvalidRecurrence(
                "day and weekday rules do not take a window",
            ));
        }
        let midnight = LocalTime::default();
        let has_mark = (0..24 * 60)
            .map(|minute| midnight + Duration::minutes(minute))
            .any(|t| self.is_due(t));
        if has_mark {
            Ok(())
        } else {
            Err(ValidationError::InvalidRecurrence(
                "the window contains none of the rule's marks",
            ))
        }
    }

    /// The anchor marks are offset by: `at` when it is not a window start.
    fn mark_offset(&self) -> (u32, u32, u32) {
        match (self.at, self.until) {
            (Some(anchor), None) => (
                anchor.hour().unwrap_or(0),
                anchor.minute(),
                anchor.second(),
            ),
            _ => (0, 0, 0),
        }
    }

    /// Whether the rule fires at the whole second `t` (sub-second precision is
    /// ignored).
    #[must_use]
    pub fn is_due(&self, t: LocalTime) -> bool {
        let t = truncate_to_second(t);
        let n = self.interval.max(1);
        let (hour, minute, second) = self.mark_offset();

        let on_mark = match self.unit {
            Unit::Minute => {
                let since_midnight = t.hour() * 60 + t.minute();
                t.second() == 0 && since_midnight % n == 0
            }
            Unit::Hour => t.minute() == minute && t.second() == second && t.hour() % n == 0,
            Unit::Day => {
                let day = i64::from(t.date().num_days_from_ce());
                (t.hour(), t.minute(), t.second()) == (hour, minute, second)
                    && day.rem_euclid(i64::from(n)) == 0
            }
            Unit::Weekday(weekday) => {
                t.weekday() == weekday
                    && (t.hour(), t.minute(), t.second()) == (hour, minute, second)
                    && t.iso_week().week() % n == 0
            }
        };
        if !on_mark {
            return false;
        }
        match (self.at, self.until) {
            (Some(start), Some(end)) => start.window_contains(&end, t),
            _ => true,
        }
    }

    /// The first second strictly after `t` at which the rule fires.
    ///
    /// Returns `None` when nothing fires within one full cycle (e.g. an
    /// empty window).
    #[must_use]
    pub fn next_after(&self, t: LocalTime) -> Option<LocalTime> {
        let t = truncate_to_second(t);
        let (_, _, second) = self.mark_offset();
        // Every mark sits at a fixed second within its minute.
        let base = t.with_second(second)?;
        let mut candidate = if base > t {
            base
        } else {
            base + Duration::minutes(1)
        };
        let horizon = i64::from(self.interval.max(1)) * 7 * 24 * 60 + 7 * 24 * 60;
        for _ in 0..horizon {
            if self.is_due(candidate) {
                return Some(candidate);
            }
            candidate += Duration::minutes(1);
        }
        None
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            Unit::Minute => "minute".to_string(),
            Unit::Hour => "hour".to_string(),
            Unit::Day => "day".to_string(),
            Unit::Weekday(day) => format!("{day}"),
        };
        if self.interval == 1 {
            write!(f, "every {unit}")?;
        } else {
            write!(f, "every {} {unit}s", self.interval)?;
        }
        if let Some(at) = self.at {
            write!(f, " at {at}")?;
        }
        if let Some(until) = self.until {
            write!(f, " until {until}")?;
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Recurrence`].
#[derive(Debug, Clone, Default)]
pub struct RecurrenceBuilder {
    interval: u32,
    unit: Option<Unit>,
    at: Option<ClockTime>,
    until: Option<ClockTime>,
}

impl RecurrenceBuilder {
    #[must_use]
    pub fn minutes(mut self) -> Self {
        self.unit = Some(Unit::Minute);
        self
    }

    #[must_use]
    pub fn hours(mut self) -> Self {
        self.unit = Some(Unit::Hour);
        self
    }

    #[must_use]
    pub fn days(mut self) -> Self {
        self.unit = Some(Unit::Day);
        self
    }

    /// Fire on `weekday`, every `interval` weeks.
    #[must_use]
    pub fn on(mut self, weekday: Weekday) -> Self {
        self.unit = Some(Unit::Weekday(weekday));
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Anchor the marks, or open the window when [`until`](Self::until) is also set.
    #[must_use]
    pub fn at(mut self, anchor: ClockTime) -> Self {
        self.at = Some(anchor);
        self
    }

    /// Close the window opened by [`at`](Self::at).
    #[must_use]
    pub fn until(mut self, anchor: ClockTime) -> Self {
        self.until = Some(anchor);
        self
    }

    /// Consume the builder, validate, and return a [`Recurrence`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if no unit was chosen or the rule is
    /// inconsistent (see [`Recurrence::validate`]).
    pub fn build(self) -> Result<Recurrence, ValidationError> {
        let unit = self
            .unit
            .ok_or(ValidationError::InvalidRecurrence("a unit must be chosen"))?;
        let recurrence = Recurrence {
            unit,
            interval: self.interval,
            at: self.at,
            until: self.until,
        };
        recurrence.validate()?;
        Ok(recurrence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32, s: u32) -> LocalTime {
        // March 2024: the 4th is a Monday.
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn anchor(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    /// Every second of `[from, from + secs)` at which `rule` is due.
    fn fires(rule: &Recurrence, from: LocalTime, secs: i64) -> Vec<LocalTime> {
        (0..secs)
            .map(|i| from + Duration::seconds(i))
            .filter(|t| rule.is_due(*t))
            .collect()
    }

    #[test]
    fn should_fire_every_ten_minutes_on_minute_marks() {
        let rule = Recurrence::every(10).minutes().build().unwrap();
        let fired = fires(&rule, at(4, 9, 0, 0), 3600);
        let minutes: Vec<u32> = fired.iter().map(|t| t.minute()).collect();
        assert_eq!(minutes, vec![0, 10, 20, 30, 40, 50]);
        assert!(fired.iter().all(|t| t.second() == 0));
    }

    #[test]
    fn should_not_fire_between_marks() {
        let rule = Recurrence::every(10).minutes().build().unwrap();
        assert!(!rule.is_due(at(4, 9, 5, 0)));
        assert!(!rule.is_due(at(4, 9, 10, 1)));
        assert!(rule.is_due(at(4, 9, 10, 0)));
    }

    #[test]
    fn should_fire_only_inside_wrapped_window() {
        let rule = Recurrence::every(1)
            .minutes()
            .at(anchor(":58"))
            .until(anchor(":02"))
            .build()
            .unwrap();
        let fired = fires(&rule, at(4, 9, 0, 0), 2 * 3600);
        let marks: Vec<(u32, u32)> = fired.iter().map(|t| (t.hour(), t.minute())).collect();
        assert_eq!(
            marks,
            vec![(9, 0), (9, 1), (9, 58), (9, 59), (10, 0), (10, 1), (10, 58), (10, 59)]
        );
    }

    #[test]
    fn should_fire_hourly_at_anchor_minute() {
        let rule = Recurrence::every(2).hours().at(anchor(":30")).build().unwrap();
        let fired = fires(&rule, at(4, 0, 0, 0), 6 * 3600);
        let marks: Vec<(u32, u32)> = fired.iter().map(|t| (t.hour(), t.minute())).collect();
        assert_eq!(marks, vec![(0, 30), (2, 30), (4, 30)]);
    }

    #[test]
    fn should_fire_daily_at_time_of_day() {
        let rule = Recurrence::every(1).days().at(anchor("07:15")).build().unwrap();
        assert!(rule.is_due(at(4, 7, 15, 0)));
        assert!(rule.is_due(at(5, 7, 15, 0)));
        assert!(!rule.is_due(at(5, 7, 15, 1)));
        assert!(!rule.is_due(at(5, 19, 15, 0)));
    }

    #[test]
    fn should_skip_days_outside_interval() {
        let rule = Recurrence::every(2).days().at(anchor("07:15")).build().unwrap();
        let fired_days: Vec<u32> = (1..=6)
            .filter(|d| rule.is_due(at(*d, 7, 15, 0)))
            .collect();
        assert_eq!(fired_days.len(), 3);
        assert!(fired_days.windows(2).all(|w| w[1] - w[0] == 2));
    }

    #[test]
    fn should_fire_on_weekday_only() {
        let rule = Recurrence::every(1)
            .on(Weekday::Mon)
            .at(anchor("06:00"))
            .build()
            .unwrap();
        assert!(rule.is_due(at(4, 6, 0, 0)));
        assert!(!rule.is_due(at(5, 6, 0, 0)));
        assert!(rule.is_due(at(11, 6, 0, 0)));
    }

    #[test]
    fn should_fire_hourly_marks_inside_daily_window() {
        let rule = Recurrence::every(1)
            .hours()
            .at(anchor("22:00"))
            .until(anchor("02:00"))
            .build()
            .unwrap();
        let hours: Vec<u32> = fires(&rule, at(4, 0, 0, 0), 24 * 3600)
            .iter()
            .map(|t| t.hour())
            .collect();
        assert_eq!(hours, vec![0, 1, 22, 23]);
    }

    #[test]
    fn should_ignore_sub_second_precision() {
        let rule = Recurrence::every(1).minutes().build().unwrap();
        let t = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_milli_opt(9, 0, 0, 400)
            .unwrap();
        assert!(rule.is_due(t));
    }

    #[test]
    fn should_reject_zero_interval() {
        let err = Recurrence::every(0).minutes().build().unwrap_err();
        assert_eq!(err, ValidationError::ZeroInterval);
    }

    #[test]
    fn should_reject_missing_unit() {
        assert!(Recurrence::every(1).build().is_err());
    }

    #[test]
    fn should_reject_until_without_at() {
        assert!(Recurrence::every(1).minutes().until(anchor(":02")).build().is_err());
    }

    #[test]
    fn should_reject_mixed_window_shapes() {
        let result = Recurrence::every(1)
            .minutes()
            .at(anchor("08:00"))
            .until(anchor(":30"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_anchor_shape_not_matching_unit() {
        assert!(Recurrence::every(1).minutes().at(anchor(":10")).build().is_err());
        assert!(Recurrence::every(1).hours().at(anchor("10:00")).build().is_err());
        assert!(Recurrence::every(1).days().at(anchor(":10")).build().is_err());
    }

    #[test]
    fn should_find_next_mark_after_time() {
        let rule = Recurrence::every(10).minutes().build().unwrap();
        assert_eq!(rule.next_after(at(4, 9, 3, 12)), Some(at(4, 9, 10, 0)));
        assert_eq!(rule.next_after(at(4, 9, 10, 0)), Some(at(4, 9, 20, 0)));
    }

    #[test]
    fn should_find_next_weekly_mark() {
        let rule = Recurrence::every(1)
            .on(Weekday::Mon)
            .at(anchor("06:00:30"))
            .build()
            .unwrap();
        assert_eq!(rule.next_after(at(5, 12, 0, 0)), Some(at(11, 6, 0, 30)));
    }

    #[test]
    fn should_reject_empty_window() {
        let result = Recurrence::every(1)
            .minutes()
            .at(anchor(":10"))
            .until(anchor(":10"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_window_on_day_rule() {
        let result = Recurrence::every(1)
            .days()
            .at(anchor("08:00"))
            .until(anchor("20:00"))
            .build();
        assert!(result.is_err());
        let result = Recurrence::every(1)
            .on(Weekday::Sat)
            .at(anchor("08:00"))
            .until(anchor("20:00"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_hour_window_without_hour_mark() {
        let result = Recurrence::every(1)
            .hours()
            .at(anchor(":10"))
            .until(anchor(":20"))
            .build();
        assert!(result.is_err());
        let result = Recurrence::every(1)
            .hours()
            .at(anchor("08:30"))
            .until(anchor("08:45"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn should_reject_minute_window_missing_every_mark() {
        let result = Recurrence::every(30)
            .minutes()
            .at(anchor(":05"))
            .until(anchor(":25"))
            .build();
        assert!(result.is_err());
        let rule = Recurrence::every(30)
            .minutes()
            .at(anchor(":05"))
            .until(anchor(":35"))
            .build()
            .unwrap();
        assert_eq!(rule.next_after(at(4, 9, 0, 0)), Some(at(4, 9, 30, 0)));
    }

    #[test]
    fn should_restart_counting_at_cycle_start() {
        let rule = Recurrence::every(7).minutes().build().unwrap();
        assert_eq!(rule.next_after(at(4, 23, 55, 0)), Some(at(5, 0, 0, 0)));
        let rule = Recurrence::every(5).hours().at(anchor(":00")).build().unwrap();
        assert_eq!(rule.next_after(at(4, 20, 0, 0)), Some(at(5, 0, 0, 0)));
    }

    #[test]
    fn should_describe_rule_in_words() {
        let rule = Recurrence::every(1)
            .minutes()
            .at(anchor(":58"))
            .until(anchor(":02"))
            .build()
            .unwrap();
        assert_eq!(rule.to_string(), "every minute at :58 until :02");
        let rule = Recurrence::every(10).minutes().build().unwrap();
        assert_eq!(rule.to_string(), "every 10 minutes");
    }
}
