//! `GET /api/schedules`: registered schedules with their next run.

use axum::Json;
use axum::extract::State;

use relayhub_app::scheduler::ScheduleInfo;

use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Json<Vec<ScheduleInfo>> {
    Json(state.hub.scheduler().list())
}
