//! Registry: the process-wide mapping from identifier to action.
//!
//! Registration is write-once per identifier. Lookups that miss locally fall
//! back to an optional [`RemoteResolver`], so callers use the same
//! [`ActionRef`] whether the action runs here or in another process.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use relayhub_domain::action::{ActionInfo, Origin};
use relayhub_domain::error::{DuplicateIdentifierError, RelayHubError, UnknownActionError};
use relayhub_domain::id::ActionId;
use relayhub_domain::value::{Args, Value};

use crate::action::{Action, CallOptions, Outcome};
use crate::ports::RemoteResolver;

/// Registered actions, plus an optional fallback to remote peers.
#[derive(Default)]
pub struct Registry {
    actions: RwLock<HashMap<ActionId, Arc<Action>>>,
    remote: Option<Arc<dyn RemoteResolver>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that asks `resolver` about identifiers it does not know.
    #[must_use]
    pub fn with_remote(resolver: Arc<dyn RemoteResolver>) -> Self {
        Self {
            actions: RwLock::default(),
            remote: Some(resolver),
        }
    }

    /// Register `action` under its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::DuplicateIdentifier`] if the identifier is
    /// taken; the earlier action stays registered.
    #[tracing::instrument(skip_all, fields(action = %action.id()))]
    pub fn register(&self, action: Action) -> Result<Arc<Action>, RelayHubError> {
        let mut actions = self
            .actions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if actions.contains_key(action.id()) {
            tracing::warn!("identifier already registered");
            return Err(DuplicateIdentifierError {
                id: action.id().clone(),
            }
            .into());
        }
        let action = Arc::new(action);
        actions.insert(action.id().clone(), Arc::clone(&action));
        tracing::debug!("action registered");
        Ok(action)
    }

    /// Local action registered under `id`, if any.
    #[must_use]
    pub fn get(&self, id: &ActionId) -> Option<Arc<Action>> {
        self.actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    #[must_use]
    pub fn contains(&self, id: &ActionId) -> bool {
        self.get(id).is_some()
    }

    /// Metadata of every local action, sorted by identifier.
    #[must_use]
    pub fn list(&self) -> Vec<ActionInfo> {
        let mut infos: Vec<ActionInfo> = self
            .actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|action| action.info())
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    /// Find `id` locally, then through the remote resolver.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::UnknownAction`] if neither knows it, or the
    /// resolver's own failure.
    pub async fn resolve(&self, id: &ActionId) -> Result<ActionRef, RelayHubError> {
        if let Some(action) = self.get(id) {
            return Ok(ActionRef::Local(action));
        }
        if let Some(remote) = &self.remote
            && let Some(info) = remote.describe(id).await?
        {
            tracing::debug!(action = %id, "resolved remote action");
            return Ok(ActionRef::Remote(RemoteAction {
                info,
                resolver: Arc::clone(remote),
            }));
        }
        Err(UnknownActionError { id: id.clone() }.into())
    }

    /// Resolve and invoke `id`.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve) and [`Action::call_with`].
    pub async fn call(
        &self,
        id: &ActionId,
        args: Args,
        options: CallOptions,
    ) -> Result<Outcome, RelayHubError> {
        self.resolve(id).await?.call_with(args, options).await
    }

    /// Resolve and interrupt `id`.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve) and [`Action::interrupt`].
    pub async fn interrupt(&self, id: &ActionId, args: Args) -> Result<bool, RelayHubError> {
        self.resolve(id).await?.interrupt(args).await
    }
}

/// A resolved action, local or remote.
#[derive(Debug)]
pub enum ActionRef {
    Local(Arc<Action>),
    Remote(RemoteAction),
}

impl ActionRef {
    #[must_use]
    pub fn id(&self) -> &ActionId {
        match self {
            Self::Local(action) => action.id(),
            Self::Remote(remote) => &remote.info.id,
        }
    }

    #[must_use]
    pub fn info(&self) -> ActionInfo {
        match self {
            Self::Local(action) => action.info(),
            Self::Remote(remote) => remote.info.clone(),
        }
    }

    /// Invoke with the same contract as [`Action::call_with`].
    ///
    /// # Errors
    ///
    /// See [`Action::call_with`].
    pub async fn call_with(
        &self,
        args: Args,
        options: CallOptions,
    ) -> Result<Outcome, RelayHubError> {
        match self {
            Self::Local(action) => action.call_with(args, options).await,
            Self::Remote(remote) => remote.resolver.call(&remote.info.id, args, options).await,
        }
    }

    /// Synchronous call with default options.
    ///
    /// # Errors
    ///
    /// See [`Action::call_with`].
    pub async fn call(&self, args: Args) -> Result<Value, RelayHubError> {
        self.call_with(args, CallOptions::sync())
            .await
            .map(Outcome::into_value)
    }

    /// Interrupt with the same contract as [`Action::interrupt`].
    ///
    /// # Errors
    ///
    /// See [`Action::interrupt`].
    pub async fn interrupt(&self, args: Args) -> Result<bool, RelayHubError> {
        match self {
            Self::Local(action) => action.interrupt(args).await,
            Self::Remote(remote) => remote.resolver.interrupt(&remote.info.id, args).await,
        }
    }
}

/// An action another process defines, reached through a [`RemoteResolver`].
pub struct RemoteAction {
    info: ActionInfo,
    resolver: Arc<dyn RemoteResolver>,
}

impl RemoteAction {
    #[must_use]
    pub fn info(&self) -> &ActionInfo {
        &self.info
    }
}

impl std::fmt::Debug for RemoteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteAction")
            .field("id", &self.info.id)
            .field("origin", &Origin::Remote)
            .finish_non_exhaustive()
    }
}
