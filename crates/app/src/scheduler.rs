//! Scheduler: fires actions on recurrences from one background clock loop.
//!
//! Every tick looks at each whole second between the previous tick and now
//! and fires the schedules due at that second. A second is only ever fired
//! once per schedule, so ticking faster than once a second is harmless and
//! a late tick catches up on the seconds it missed. Clock jumps larger than
//! [`MAX_CATCH_UP`] are not replayed: only the current second is examined.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::TimeDelta;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use relayhub_domain::error::RelayHubError;
use relayhub_domain::id::{ActionId, ScheduleId};
use relayhub_domain::recurrence::{ClockTime, Recurrence, RecurrenceBuilder, Unit};
use relayhub_domain::time::{LocalTime, truncate_to_second};
use relayhub_domain::value::Args;

use crate::action::CallOptions;
use crate::ports::Clock;
use crate::registry::Registry;

/// Default resolution of the clock loop.
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

/// Longest gap between ticks that is replayed second by second.
pub const MAX_CATCH_UP: TimeDelta = TimeDelta::seconds(120);

/// Where a schedule is in its firing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleState {
    Idle,
    Due,
    Firing,
}

struct Entry {
    id: ScheduleId,
    target: ActionId,
    recurrence: Recurrence,
    args: Args,
    state: ScheduleState,
    last_fired: Option<LocalTime>,
}

/// Serialisable view of one schedule.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleInfo {
    pub id: ScheduleId,
    pub action: ActionId,
    pub recurrence: String,
    pub args: Args,
    pub state: ScheduleState,
    pub last_fired: Option<LocalTime>,
    pub next_run: Option<LocalTime>,
}

/// Time-based trigger engine.
pub struct Scheduler {
    registry: Arc<Registry>,
    clock: Arc<dyn Clock>,
    entries: Mutex<Vec<Entry>>,
    last_tick: Mutex<Option<LocalTime>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(registry: Arc<Registry>, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry,
            clock,
            entries: Mutex::default(),
            last_tick: Mutex::default(),
        }
    }

    /// Start describing a schedule for `target`, firing every `interval`
    /// units.
    pub fn every(&self, target: ActionId, interval: u32) -> ScheduleBuilder<'_> {
        ScheduleBuilder {
            scheduler: self,
            target,
            recurrence: Recurrence::every(interval),
        }
    }

    /// Fire `target` with `args` whenever `recurrence` is due.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::Validation`] if `recurrence` is inconsistent.
    pub fn add(
        &self,
        target: ActionId,
        recurrence: Recurrence,
        args: Args,
    ) -> Result<ScheduleId, RelayHubError> {
        recurrence.validate()?;
        let id = ScheduleId::new();
        tracing::info!(schedule = %id, action = %target, %recurrence, "schedule added");
        lock(&self.entries).push(Entry {
            id,
            target,
            recurrence,
            args,
            state: ScheduleState::Idle,
            last_fired: None,
        });
        Ok(id)
    }

    /// Every schedule with its next due time.
    #[must_use]
    pub fn list(&self) -> Vec<ScheduleInfo> {
        let now = self.clock.now();
        lock(&self.entries)
            .iter()
            .map(|entry| ScheduleInfo {
                id: entry.id,
                action: entry.target.clone(),
                recurrence: entry.recurrence.to_string(),
                args: entry.args.clone(),
                state: entry.state,
                last_fired: entry.last_fired,
                next_run: entry.recurrence.next_after(now),
            })
            .collect()
    }

    /// Examine the seconds elapsed since the previous tick and fire what is
    /// due. Returns the schedules fired, once per due second.
    pub async fn tick(&self) -> Vec<ScheduleId> {
        let now = truncate_to_second(self.clock.now());
        let seconds = {
            let mut last_tick = lock(&self.last_tick);
            let seconds = seconds_to_examine(*last_tick, now);
            *last_tick = Some(now);
            seconds
        };
        if seconds.is_empty() {
            return Vec::new();
        }

        let due: Vec<(ScheduleId, ActionId, Args)> = {
            let mut entries = lock(&self.entries);
            let mut due = Vec::new();
            for entry in entries.iter_mut() {
                for &second in &seconds {
                    if entry.last_fired == Some(second) || !entry.recurrence.is_due(second) {
                        continue;
                    }
                    entry.state = ScheduleState::Due;
                    entry.last_fired = Some(second);
                    due.push((entry.id, entry.target.clone(), entry.args.clone()));
                }
            }
            due
        };

        let mut fired = Vec::with_capacity(due.len());
        for (id, target, args) in due {
            self.set_state(id, ScheduleState::Firing);
            match self.registry.call(&target, args, CallOptions::background()).await {
                Ok(_) => {
                    tracing::debug!(schedule = %id, action = %target, "schedule fired");
                    fired.push(id);
                }
                Err(err) => {
                    tracing::warn!(schedule = %id, action = %target, %err, "schedule could not fire");
                }
            }
            self.set_state(id, ScheduleState::Idle);
        }
        fired
    }

    fn set_state(&self, id: ScheduleId, state: ScheduleState) {
        if let Some(entry) = lock(&self.entries).iter_mut().find(|e| e.id == id) {
            entry.state = state;
        }
    }

    /// Spawn the clock loop, ticking every `resolution` until `shutdown` is
    /// cancelled.
    pub fn spawn(self: Arc<Self>, resolution: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(resolution);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        self.tick().await;
                    }
                }
            }
            tracing::debug!("scheduler stopped");
        })
    }
}

fn seconds_to_examine(last: Option<LocalTime>, now: LocalTime) -> Vec<LocalTime> {
    match last {
        Some(last) if last == now => Vec::new(),
        Some(last) if last < now && now - last <= MAX_CATCH_UP => {
            let gap = (now - last).num_seconds();
            (1..=gap).map(|s| last + TimeDelta::seconds(s)).collect()
        }
        _ => vec![now],
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fluent description of a schedule, finished by [`run`](Self::run).
///
/// ```ignore
/// scheduler.every(id, 10).minutes().run(Args::new())?;
/// scheduler.every(id, 1).minutes().at(":58".parse()?).until(":02".parse()?).run(Args::new())?;
/// ```
#[must_use]
pub struct ScheduleBuilder<'a> {
    scheduler: &'a Scheduler,
    target: ActionId,
    recurrence: RecurrenceBuilder,
}

impl ScheduleBuilder<'_> {
    pub fn minutes(mut self) -> Self {
        self.recurrence = self.recurrence.minutes();
        self
    }

    pub fn hours(mut self) -> Self {
        self.recurrence = self.recurrence.hours();
        self
    }

    pub fn days(mut self) -> Self {
        self.recurrence = self.recurrence.days();
        self
    }

    pub fn on(mut self, weekday: chrono::Weekday) -> Self {
        self.recurrence = self.recurrence.on(weekday);
        self
    }

    pub fn unit(mut self, unit: Unit) -> Self {
        self.recurrence = self.recurrence.unit(unit);
        self
    }

    /// Anchor, or window start when followed by [`until`](Self::until).
    pub fn at(mut self, anchor: ClockTime) -> Self {
        self.recurrence = self.recurrence.at(anchor);
        self
    }

    /// Window end (exclusive).
    pub fn until(mut self, anchor: ClockTime) -> Self {
        self.recurrence = self.recurrence.until(anchor);
        self
    }

    /// Register the schedule with the arguments to call the action with.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::Validation`] if the recurrence is
    /// inconsistent.
    pub fn run(self, args: Args) -> Result<ScheduleId, RelayHubError> {
        let recurrence = self.recurrence.build()?;
        self.scheduler.add(self.target, recurrence, args)
    }
}
