//! Signal port: publish value changes of a source.

use std::future::Future;

use relayhub_domain::error::RelayHubError;
use relayhub_domain::id::SignalId;
use relayhub_domain::value::Value;

/// Publishes new values of signal sources to interested subscribers.
pub trait SignalPublisher {
    /// Record `value` as the latest value of `source`.
    ///
    /// Subscribers are only notified when the value differs from the
    /// previous one.
    fn publish(
        &self,
        source: SignalId,
        value: Value,
    ) -> impl Future<Output = Result<(), RelayHubError>> + Send;
}

impl<T: SignalPublisher + Send + Sync> SignalPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        source: SignalId,
        value: Value,
    ) -> impl Future<Output = Result<(), RelayHubError>> + Send {
        (**self).publish(source, value)
    }
}
