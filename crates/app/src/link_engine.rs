//! Link engine: reacts to value changes by invoking or interrupting actions.
//!
//! The engine drains the signal bus in one background task and hands every
//! matching notification to the lane of its link. A lane is a queue drained
//! by its own task, so the links of one source see its values in order while
//! a slow interrupt handler only ever holds up its own link. Within a lane
//! the interrupt trigger is handled first, then the invoke trigger.
//! Invocations are always asynchronous.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use relayhub_domain::id::{ActionId, LinkId, SignalId};
use relayhub_domain::link::{Link, LinkConfig, LinkDecision, LinkInfo};
use relayhub_domain::signal::ValueChanged;

use crate::action::CallOptions;
use crate::registry::Registry;

/// What one notification did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub invoked: usize,
    pub interrupted: usize,
}

impl std::ops::AddAssign for Fired {
    fn add_assign(&mut self, other: Self) {
        self.invoked += other.invoked;
        self.interrupted += other.interrupted;
    }
}

/// Reactive binding of actions to signal sources.
pub struct LinkEngine {
    registry: Arc<Registry>,
    links: RwLock<Vec<Link>>,
    lanes: Mutex<HashMap<LinkId, mpsc::UnboundedSender<LinkDecision>>>,
}

impl LinkEngine {
    /// Create an engine resolving targets through `registry`.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            links: RwLock::default(),
            lanes: Mutex::default(),
        }
    }

    /// Bind `target` to value changes of `source`.
    ///
    /// The target is resolved each time the link fires, so it may be
    /// registered later or live in another process.
    pub fn add(&self, source: SignalId, target: ActionId, config: LinkConfig) -> LinkId {
        let link = Link {
            id: LinkId::new(),
            source,
            target,
            config,
        };
        let id = link.id;
        tracing::info!(link = %id, source = %link.source, action = %link.target, "link added");
        self.links
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(link);
        id
    }

    /// Summaries of every link, in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<LinkInfo> {
        self.links
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(LinkInfo::from)
            .collect()
    }

    /// Links bound to `source` whose triggers match `change.value`.
    fn matching(&self, change: &ValueChanged) -> Vec<(Link, LinkDecision)> {
        self.links
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|link| link.source == change.source)
            .filter_map(|link| {
                let decision = link.config.evaluate(&change.value);
                (decision.invoke.is_some() || decision.interrupt.is_some())
                    .then(|| (link.clone(), decision))
            })
            .collect()
    }

    /// Evaluate every link bound to `change.source` and wait until each one
    /// has been handled, interrupt handlers included.
    ///
    /// Failures of individual links (unknown target, failing interrupt
    /// handler, bad arguments) are logged and do not stop the others.
    pub async fn notify(&self, change: &ValueChanged) -> Fired {
        let mut fired = Fired::default();
        for (link, decision) in self.matching(change) {
            fired += fire(&self.registry, &link, decision).await;
        }
        fired
    }

    /// Queue `change` on the lane of every matching link and return at once.
    ///
    /// Returns the number of lanes fed. Must be called from within a tokio
    /// runtime: lanes are spawned on first use.
    pub fn dispatch(&self, change: &ValueChanged) -> usize {
        let matching = self.matching(change);
        let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
        let mut fed = 0;
        for (link, decision) in matching {
            let lane = lanes
                .entry(link.id)
                .or_insert_with(|| spawn_lane(Arc::clone(&self.registry), link.clone()));
            if lane.send(decision).is_ok() {
                fed += 1;
            } else {
                tracing::warn!(link = %link.id, "link lane closed, value change dropped");
            }
        }
        fed
    }

    /// Spawn the task draining `receiver` until `shutdown` is cancelled or
    /// the bus closes.
    ///
    /// Lanes are closed when the task stops; values already queued are
    /// still handled.
    pub fn spawn(
        self: Arc<Self>,
        mut receiver: broadcast::Receiver<ValueChanged>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let change = tokio::select! {
                    () = shutdown.cancelled() => break,
                    received = receiver.recv() => received,
                };
                match change {
                    Ok(change) => {
                        self.dispatch(&change);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "link engine lagged, some value changes were dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            self.lanes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clear();
            tracing::debug!("link engine stopped");
        })
    }
}

fn spawn_lane(registry: Arc<Registry>, link: Link) -> mpsc::UnboundedSender<LinkDecision> {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(decision) = receiver.recv().await {
            fire(&registry, &link, decision).await;
        }
        tracing::debug!(link = %link.id, "link lane closed");
    });
    sender
}

async fn fire(registry: &Registry, link: &Link, decision: LinkDecision) -> Fired {
    let mut fired = Fired::default();
    let target = match registry.resolve(&link.target).await {
        Ok(target) => target,
        Err(err) => {
            tracing::warn!(link = %link.id, action = %link.target, %err, "link target unavailable");
            return fired;
        }
    };

    if let Some(args) = decision.interrupt {
        match target.interrupt(args).await {
            Ok(true) => fired.interrupted += 1,
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(link = %link.id, action = %link.target, %err, "link interrupt failed");
            }
        }
    }

    if let Some(args) = decision.invoke {
        match target.call_with(args, CallOptions::background()).await {
            Ok(_) => fired.invoked += 1,
            Err(err) => {
                tracing::warn!(link = %link.id, action = %link.target, %err, "link invocation failed");
            }
        }
    }
    fired
}
