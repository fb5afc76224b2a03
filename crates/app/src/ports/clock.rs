//! Clock port: the wall clock schedules are matched against.

use relayhub_domain::time::{LocalTime, local_now};

/// Source of the current local wall-clock time.
///
/// The scheduler only ever reads time through this trait so tests can drive
/// it with a manual clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> LocalTime;
}

/// [`Clock`] reading the host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> LocalTime {
        local_now()
    }
}
