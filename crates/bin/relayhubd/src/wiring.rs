//! Declarative schedules and links from the config file.

use relayhub_app::hub::Hub;
use relayhub_domain::error::RelayHubError;

use crate::config::Config;

/// Register every `[[schedules]]` and `[[links]]` entry on `hub`.
///
/// Targets are resolved when they fire; one that is not registered locally
/// may still be provided by a remote peer, so it only draws a warning.
///
/// # Errors
///
/// Returns [`RelayHubError::Validation`] if a schedule is inconsistent.
pub fn apply(hub: &Hub, config: &Config) -> Result<(), RelayHubError> {
    for entry in &config.schedules {
        if !hub.registry().contains(&entry.action) {
            tracing::warn!(action = %entry.action, "schedule target is not registered locally");
        }
        hub.scheduler()
            .add(entry.action.clone(), entry.recurrence()?, entry.args())?;
    }
    for entry in &config.links {
        if !hub.registry().contains(&entry.action) {
            tracing::warn!(action = %entry.action, "link target is not registered locally");
        }
        hub.links()
            .add(entry.source.clone(), entry.action.clone(), entry.link_config());
    }
    Ok(())
}
