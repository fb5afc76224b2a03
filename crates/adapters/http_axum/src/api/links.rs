//! `GET /api/links`: registered signal-to-action links.

use axum::Json;
use axum::extract::State;

use relayhub_domain::link::LinkInfo;

use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Json<Vec<LinkInfo>> {
    Json(state.hub.links().list())
}
