//! Shared application state for axum handlers.

use std::sync::Arc;

use relayhub_app::hub::Hub;

/// Application state shared across all axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<Hub>,
}

impl AppState {
    #[must_use]
    pub fn new(hub: Arc<Hub>) -> Self {
        Self { hub }
    }
}
