//! Reserved system identifiers and process lifecycle reasons.

use serde::{Deserialize, Serialize};

/// Stop the process.
pub const APP_STOP: &str = "app.stop";
/// Stop and start the process again.
pub const APP_RESTART: &str = "app.restart";
/// Stop the process and power the host off.
pub const APP_SHUTDOWN: &str = "app.shutdown";
/// Stop the process and reboot the host.
pub const APP_REBOOT: &str = "app.reboot";

/// Hook invoked once after startup completes.
pub const APP_MAIN: &str = "app_main";
/// Hook invoked once during teardown.
pub const APP_EXIT: &str = "app_exit";

/// Why the process is leaving its run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitReason {
    Stop,
    Restart,
    Shutdown,
    Reboot,
}

impl ExitReason {
    /// The reserved action that requests this exit.
    #[must_use]
    pub fn action_id(self) -> &'static str {
        match self {
            Self::Stop => APP_STOP,
            Self::Restart => APP_RESTART,
            Self::Shutdown => APP_SHUTDOWN,
            Self::Reboot => APP_REBOOT,
        }
    }

    #[must_use]
    pub fn all() -> [Self; 4] {
        [Self::Stop, Self::Restart, Self::Shutdown, Self::Reboot]
    }
}

/// Whether `id` belongs to the reserved `app.` namespace.
#[must_use]
pub fn is_reserved(id: &str) -> bool {
    id.starts_with("app.")
}
