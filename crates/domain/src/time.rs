//! Time and timestamp helpers.
//!
//! Notifications carry UTC timestamps; recurrences are matched against the
//! local wall clock ([`LocalTime`]) since "every day at 07:00" means the
//! owner's morning, not UTC's.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

/// UTC timestamp used for notification times.
pub type Timestamp = DateTime<Utc>;

/// Local wall-clock time without zone, the unit schedules are matched in.
pub type LocalTime = NaiveDateTime;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Return the current local wall-clock time.
#[must_use]
pub fn local_now() -> LocalTime {
    chrono::Local::now().naive_local()
}

/// Drop sub-second precision.
#[must_use]
pub fn truncate_to_second(t: LocalTime) -> LocalTime {
    t.with_nanosecond(0).unwrap_or(t)
}
