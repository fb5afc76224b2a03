//! Virtual light: switched by the `light.turn_on` / `light.turn_off` actions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::json;

use relayhub_app::action::Action;
use relayhub_domain::error::ValidationError;

/// A simulated light.
///
/// Clones share the same state, so the actions built by
/// [`actions`](Self::actions) switch the light they were built from.
#[derive(Debug, Clone, Default)]
pub struct VirtualLight {
    on: Arc<AtomicBool>,
}

impl VirtualLight {
    #[must_use]
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    /// The `light.turn_on` and `light.turn_off` actions.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if an action cannot be built.
    pub fn actions(&self) -> Result<Vec<Action>, ValidationError> {
        [("turn_on", "Turn light on", true), ("turn_off", "Turn light off", false)]
            .into_iter()
            .map(|(function, name, level)| {
                let on = Arc::clone(&self.on);
                Action::builder(function)
                    .controller("light")
                    .name(name)
                    .work(move |_| {
                        on.store(level, Ordering::SeqCst);
                        tracing::info!(on = level, "virtual light switched");
                        async move { Ok(json!({ "on": level })) }
                    })
                    .build()
            })
            .collect()
    }
}
