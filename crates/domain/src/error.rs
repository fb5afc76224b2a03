//! Common error types used across the workspace.
//!
//! Every layer converts into [`RelayHubError`] via `#[from]`. The same
//! taxonomy is used whether an action ran locally or was resolved through a
//! remote peer, so callers never branch on where an action lives.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::id::ActionId;

/// Top-level error type for all relayhub operations.
#[derive(Debug, thiserror::Error)]
pub enum RelayHubError {
    /// An identifier, anchor, or recurrence failed validation.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// Lookup of an identifier nobody registered.
    #[error(transparent)]
    UnknownAction(#[from] UnknownActionError),

    /// Two registrations collided on one identifier.
    #[error(transparent)]
    DuplicateIdentifier(#[from] DuplicateIdentifierError),

    /// A synchronous call exceeded its timeout. The work keeps running.
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    /// Call arguments do not fit the parameters the action declares.
    #[error("invalid arguments")]
    Binding(#[from] BindingError),

    /// The work function (or interrupt handler) failed on its own.
    #[error("action `{action}` failed: {source}")]
    Work {
        action: ActionId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The task executing the work function panicked.
    #[error("action `{action}` panicked")]
    Panicked { action: ActionId },
}

impl RelayHubError {
    /// Wrap a work-function failure for `action`.
    #[must_use]
    pub fn work(action: ActionId, err: anyhow::Error) -> Self {
        Self::Work {
            action,
            source: err.into(),
        }
    }
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("identifier must not be empty")]
    EmptyIdentifier,

    #[error("identifier `{0}` contains invalid characters")]
    InvalidIdentifier(String),

    #[error("invalid clock time `{0}`, expected `HH:MM[:SS]` or `:MM[:SS]`")]
    InvalidClockTime(String),

    #[error("interval must be at least 1")]
    ZeroInterval,

    #[error("{0}")]
    InvalidRecurrence(&'static str),

    #[error("action `{0}` has no work function")]
    MissingWork(String),
}

/// Lookup of an identifier that is neither local nor known to a remote peer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action `{id}`")]
pub struct UnknownActionError {
    pub id: ActionId,
}

/// Registration of an identifier that is already taken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("action `{id}` is already registered")]
pub struct DuplicateIdentifierError {
    pub id: ActionId,
}

/// A synchronous call did not complete within its bound.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("action `{action}` did not finish within {after:?}")]
pub struct TimeoutError {
    pub action: ActionId,
    pub after: Duration,
}

/// Arguments that cannot be bound onto declared parameters.
///
/// Serializable so a peer can report the exact binding failure back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum BindingError {
    #[error("takes at most {expected} positional arguments but {given} were given")]
    TooManyPositional { expected: usize, given: usize },

    #[error("got an unexpected keyword argument `{0}`")]
    UnknownKeyword(String),

    #[error("got multiple values for argument `{0}`")]
    Duplicate(String),

    #[error("missing required argument `{0}`")]
    Missing(String),
}
