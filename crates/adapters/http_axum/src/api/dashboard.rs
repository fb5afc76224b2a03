//! `GET /api/dashboard`: the controls dashboards render.

use axum::Json;
use axum::extract::State;

use relayhub_app::dashboard::Control;

use crate::state::AppState;

/// Controls in the order they were linked, with current action metadata.
pub async fn list(State(state): State<AppState>) -> Json<Vec<Control>> {
    Json(state.hub.dashboard().controls())
}
