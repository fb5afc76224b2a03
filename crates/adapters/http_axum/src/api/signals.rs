//! JSON handlers for signal values.
//!
//! `PUT` is how external producers (sensor daemons, other hubs) feed values
//! into the link engine. Writing the value a source already holds is not a
//! change and answers `204 No Content`.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use relayhub_domain::id::SignalId;
use relayhub_domain::signal::ValueChanged;
use relayhub_domain::value::Value;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for publishing a value.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub value: Value,
}

/// Latest value of one source.
#[derive(Debug, Serialize)]
pub struct Latest {
    pub source: SignalId,
    pub value: Value,
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Latest>),
    NotFound,
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
        }
    }
}

/// Possible responses from the update endpoint.
pub enum UpdateResponse {
    Changed(Json<ValueChanged>),
    Unchanged,
}

impl IntoResponse for UpdateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Changed(json) => json.into_response(),
            Self::Unchanged => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/signals`: latest value of every source.
pub async fn list(State(state): State<AppState>) -> Json<BTreeMap<SignalId, Value>> {
    Json(state.hub.signals().snapshot())
}

/// `GET /api/signals/{source}`: latest value of one source.
pub async fn get(
    State(state): State<AppState>,
    Path(source): Path<String>,
) -> Result<GetResponse, ApiError> {
    let source: SignalId = source.parse()?;
    Ok(match state.hub.signals().latest(&source) {
        Some(value) => GetResponse::Ok(Json(Latest { source, value })),
        None => GetResponse::NotFound,
    })
}

/// `PUT /api/signals/{source}`: publish a new value.
pub async fn update(
    State(state): State<AppState>,
    Path(source): Path<String>,
    Json(request): Json<UpdateRequest>,
) -> Result<UpdateResponse, ApiError> {
    let source: SignalId = source.parse()?;
    Ok(match state.hub.publish(source, request.value) {
        Some(change) => UpdateResponse::Changed(Json(change)),
        None => UpdateResponse::Unchanged,
    })
}
