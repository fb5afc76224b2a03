//! In-process signal bus backed by a tokio broadcast channel.
//!
//! Besides fanning out [`ValueChanged`] notifications the bus remembers the
//! latest value of every source, which is how it tells a change from a
//! repeated reading.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use relayhub_domain::error::RelayHubError;
use relayhub_domain::id::SignalId;
use relayhub_domain::signal::ValueChanged;
use relayhub_domain::value::Value;

use crate::ports::SignalPublisher;

/// Signal bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the notification is simply dropped).
pub struct SignalBus {
    sender: broadcast::Sender<ValueChanged>,
    latest: RwLock<HashMap<SignalId, Value>>,
}

impl SignalBus {
    /// Create a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            latest: RwLock::default(),
        }
    }

    /// Subscribe to notifications published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ValueChanged> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Record a new reading of `source`.
    ///
    /// Returns the notification if the value changed, `None` if it equals
    /// the previous reading.
    pub fn update(&self, source: SignalId, value: Value) -> Option<ValueChanged> {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        if latest.get(&source) == Some(&value) {
            return None;
        }
        let previous = latest.insert(source.clone(), value.clone());
        let change = ValueChanged::new(source, value, previous);
        let _ = self.sender.send(change.clone());
        Some(change)
    }

    /// Publish `value` on `source` even if it equals the previous one.
    ///
    /// Used for action results, where every completed run is an event.
    pub fn emit(&self, source: SignalId, value: Value) -> ValueChanged {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        let previous = latest.insert(source.clone(), value.clone());
        let change = ValueChanged::new(source, value, previous);
        let _ = self.sender.send(change.clone());
        change
    }

    /// Latest known value of `source`.
    #[must_use]
    pub fn latest(&self, source: &SignalId) -> Option<Value> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source)
            .cloned()
    }

    /// Latest value of every source, sorted by source.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<SignalId, Value> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(source, value)| (source.clone(), value.clone()))
            .collect()
    }
}

impl SignalPublisher for SignalBus {
    fn publish(
        &self,
        source: SignalId,
        value: Value,
    ) -> impl Future<Output = Result<(), RelayHubError>> + Send {
        self.update(source, value);
        async { Ok(()) }
    }
}
