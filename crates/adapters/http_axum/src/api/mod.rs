//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod actions;
pub mod dashboard;
pub mod links;
pub mod schedules;
#[allow(clippy::missing_errors_doc)]
pub mod signals;
pub mod sse;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Actions
        .route("/actions", get(actions::list))
        .route("/actions/{id}", get(actions::get))
        .route("/actions/{id}/call", post(actions::call))
        .route("/actions/{id}/interrupt", post(actions::interrupt))
        // Catalogs
        .route("/dashboard", get(dashboard::list))
        .route("/schedules", get(schedules::list))
        .route("/links", get(links::list))
        // Signals
        .route("/signals", get(signals::list))
        .route("/signals/stream", get(sse::stream))
        .route("/signals/{source}", get(signals::get).put(signals::update))
}
