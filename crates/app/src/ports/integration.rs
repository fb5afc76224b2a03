//! Integration port: pluggable producers of signal values.
//!
//! A signal source bridges something that changes over time (a sensor, a
//! GPIO channel, a simulated device) into the signal bus. It may also bring
//! its own actions, which the daemon registers alongside user actions.

use std::future::Future;

use relayhub_domain::error::RelayHubError;

use crate::action::Action;
use crate::ports::SignalPublisher;

/// A pluggable signal integration.
///
/// Implementations live in adapter crates (e.g. `adapter_virtual`).
/// The binary crate calls the lifecycle methods in order:
///
/// 1. [`actions`](Self::actions): register the integration's actions
/// 2. [`start`](Self::start): spawn the tasks that publish values
/// 3. (the hub runs)
/// 4. [`teardown`](Self::teardown): stop those tasks
pub trait SignalSource {
    /// Unique name identifying this integration (e.g. `"virtual"`).
    fn name(&self) -> &'static str;

    /// Actions this integration provides. Empty by default.
    ///
    /// # Errors
    ///
    /// Returns [`RelayHubError::Validation`] if an action cannot be built.
    fn actions(&self) -> Result<Vec<Action>, RelayHubError> {
        Ok(Vec::new())
    }

    /// Spawn background tasks that publish through `publisher` and return
    /// immediately.
    fn start(
        &mut self,
        publisher: impl SignalPublisher + Clone + Send + Sync + 'static,
    ) -> impl Future<Output = Result<(), RelayHubError>> + Send;

    /// Called on graceful shutdown.
    fn teardown(&mut self) -> impl Future<Output = Result<(), RelayHubError>> + Send;
}
