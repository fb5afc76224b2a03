//! Call options and outcomes.

use std::time::Duration;

use tokio::task::JoinHandle;

use relayhub_domain::error::RelayHubError;
use relayhub_domain::id::{ActionId, InvocationId};
use relayhub_domain::value::Value;

use super::ExitFlag;

/// How one call should run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Return immediately and run the work in the background.
    pub run_async: bool,
    /// Bound on a synchronous call. Falls back to the action's own default.
    pub timeout: Option<Duration>,
}

impl CallOptions {
    /// Wait for the result, bounded by the action's default timeout if any.
    #[must_use]
    pub fn sync() -> Self {
        Self::default()
    }

    /// Fire and forget.
    #[must_use]
    pub fn background() -> Self {
        Self {
            run_async: true,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Result of a successful call.
#[derive(Debug)]
pub enum Outcome {
    /// A synchronous call completed with this value.
    Returned(Value),
    /// A local asynchronous call is running in the background.
    Spawned(InvocationHandle),
    /// A remote asynchronous call was accepted by its peer.
    Detached,
}

impl Outcome {
    /// The returned value, or `null` for background calls.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Returned(value) => value,
            Self::Spawned(_) | Self::Detached => Value::Null,
        }
    }
}

/// Handle on a background invocation.
#[derive(Debug)]
pub struct InvocationHandle {
    id: InvocationId,
    action: ActionId,
    exit: ExitFlag,
    task: JoinHandle<Result<Value, RelayHubError>>,
}

impl InvocationHandle {
    pub(crate) fn new(
        id: InvocationId,
        action: ActionId,
        exit: ExitFlag,
        task: JoinHandle<Result<Value, RelayHubError>>,
    ) -> Self {
        Self {
            id,
            action,
            exit,
            task,
        }
    }

    #[must_use]
    pub fn id(&self) -> InvocationId {
        self.id
    }

    /// The exit flag of this invocation only.
    #[must_use]
    pub fn exit_flag(&self) -> &ExitFlag {
        &self.exit
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the invocation to complete.
    ///
    /// # Errors
    ///
    /// Returns the work function's failure, or [`RelayHubError::Panicked`]
    /// if the task panicked.
    pub async fn join(self) -> Result<Value, RelayHubError> {
        match self.task.await {
            Ok(result) => result,
            Err(_) => Err(RelayHubError::Panicked {
                action: self.action,
            }),
        }
    }
}
