//! Remote port: actions defined in another process.
//!
//! When an identifier is not registered locally the registry asks a
//! [`RemoteResolver`] whether some peer knows it. The resolver forwards calls
//! and interrupts across whatever transport it uses and reports failures
//! with the same [`RelayHubError`] variants a local action would.

use relayhub_domain::action::ActionInfo;
use relayhub_domain::error::RelayHubError;
use relayhub_domain::id::ActionId;
use relayhub_domain::value::Args;

use crate::action::{BoxFuture, CallOptions, Outcome};

/// Resolves and forwards actions that live in another process.
///
/// Object-safe so a registry can hold `Arc<dyn RemoteResolver>`.
pub trait RemoteResolver: Send + Sync {
    /// Metadata of `id` if a peer defines it.
    fn describe<'a>(
        &'a self,
        id: &'a ActionId,
    ) -> BoxFuture<'a, Result<Option<ActionInfo>, RelayHubError>>;

    /// Invoke `id` on its peer.
    ///
    /// Asynchronous calls resolve to [`Outcome::Detached`]: the peer owns the
    /// running invocation.
    fn call<'a>(
        &'a self,
        id: &'a ActionId,
        args: Args,
        options: CallOptions,
    ) -> BoxFuture<'a, Result<Outcome, RelayHubError>>;

    /// Interrupt `id` on its peer.
    fn interrupt<'a>(
        &'a self,
        id: &'a ActionId,
        args: Args,
    ) -> BoxFuture<'a, Result<bool, RelayHubError>>;
}
