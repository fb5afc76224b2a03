//! Per-invocation context handed to work functions.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use relayhub_domain::id::{ActionId, InvocationId};
use relayhub_domain::value::{Args, Map, Value};

/// Cooperative exit flag of one invocation.
///
/// The interrupt channel sets it; the work function decides when to look.
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct ExitFlag(CancellationToken);

impl ExitFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the invocation to stop. Idempotent.
    pub fn set(&self) {
        self.0.cancel();
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Wait until the flag is set.
    pub async fn wait(&self) {
        self.0.cancelled().await;
    }

    /// Sleep for `duration` unless the flag is set first.
    ///
    /// Returns `true` if the sleep was cut short by the flag.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            () = self.0.cancelled() => true,
            () = tokio::time::sleep(duration) => false,
        }
    }
}

/// What a work function receives for one run.
#[derive(Debug, Clone)]
pub struct Invocation {
    id: InvocationId,
    action: ActionId,
    args: Args,
    bound: Map<String, Value>,
    exit: ExitFlag,
}

impl Invocation {
    pub(crate) fn new(action: ActionId, args: Args, bound: Map<String, Value>) -> Self {
        Self {
            id: InvocationId::new(),
            action,
            args,
            bound,
            exit: ExitFlag::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> InvocationId {
        self.id
    }

    #[must_use]
    pub fn action(&self) -> &ActionId {
        &self.action
    }

    /// The arguments exactly as the caller passed them.
    #[must_use]
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Value bound to the declared parameter `name`, default included.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.bound.get(name)
    }

    /// All bound parameters.
    #[must_use]
    pub fn params(&self) -> &Map<String, Value> {
        &self.bound
    }

    #[must_use]
    pub fn exit_flag(&self) -> &ExitFlag {
        &self.exit
    }

    /// Shorthand for `exit_flag().is_set()`.
    #[must_use]
    pub fn should_exit(&self) -> bool {
        self.exit.is_set()
    }
}
