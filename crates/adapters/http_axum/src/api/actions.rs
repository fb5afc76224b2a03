//! JSON handlers for actions: metadata, remote invocation and interrupt.
//!
//! These endpoints are the server half of cross-process invocation: a peer
//! resolving an identifier it does not define locally describes, calls and
//! interrupts it here.

use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use relayhub_app::action::{CallOptions, Outcome};
use relayhub_app::registry::ActionRef;
use relayhub_domain::action::ActionInfo;
use relayhub_domain::error::{RelayHubError, UnknownActionError};
use relayhub_domain::id::{ActionId, InvocationId};
use relayhub_domain::value::{Args, Map, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// Header a peer sets on forwarded requests. Such requests only see local
/// actions and are never forwarded again.
pub const PEER_HEADER: &str = "x-relayhub-peer";

async fn resolve(
    state: &AppState,
    headers: &HeaderMap,
    id: &ActionId,
) -> Result<ActionRef, RelayHubError> {
    if !headers.contains_key(PEER_HEADER) {
        return state.hub.action(id).await;
    }
    match state.hub.registry().get(id) {
        Some(action) => Ok(ActionRef::Local(action)),
        None => Err(UnknownActionError { id: id.clone() }.into()),
    }
}

/// Request body of the call endpoint. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CallRequest {
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
    /// Run in the background and answer `202 Accepted` immediately.
    pub run_async: bool,
    /// Bound on a synchronous call, in milliseconds.
    pub timeout_ms: Option<u64>,
}

impl CallRequest {
    fn options(&self) -> CallOptions {
        let options = if self.run_async {
            CallOptions::background()
        } else {
            CallOptions::sync()
        };
        match self.timeout_ms {
            Some(ms) => options.with_timeout(Duration::from_millis(ms)),
            None => options,
        }
    }
}

/// Request body of the interrupt endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InterruptRequest {
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct Returned {
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct Accepted {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocation: Option<InvocationId>,
}

#[derive(Debug, Serialize)]
pub struct Interrupted {
    pub interrupted: bool,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<ActionInfo>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<ActionInfo>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the call endpoint.
pub enum CallResponse {
    Returned(Json<Returned>),
    Accepted(Json<Accepted>),
}

impl IntoResponse for CallResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Returned(json) => json.into_response(),
            Self::Accepted(json) => (StatusCode::ACCEPTED, json).into_response(),
        }
    }
}

/// Possible responses from the interrupt endpoint.
pub enum InterruptResponse {
    Ok(Json<Interrupted>),
}

impl IntoResponse for InterruptResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/actions`: metadata of every local action.
pub async fn list(State(state): State<AppState>) -> ListResponse {
    ListResponse::Ok(Json(state.hub.registry().list()))
}

/// `GET /api/actions/{id}`: metadata of one action, local or remote.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<GetResponse, ApiError> {
    let id: ActionId = id.parse()?;
    let action = resolve(&state, &headers, &id).await?;
    Ok(GetResponse::Ok(Json(action.info())))
}

/// `POST /api/actions/{id}/call`: invoke an action.
///
/// A synchronous call answers `200` with the return value. A background call
/// answers `202` with the invocation identifier when the action ran locally.
pub async fn call(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<CallRequest>>,
) -> Result<CallResponse, ApiError> {
    let id: ActionId = id.parse()?;
    let Json(request) = body.unwrap_or_default();
    let options = request.options();
    let args = Args {
        positional: request.args,
        keyword: request.kwargs,
    };

    let action = resolve(&state, &headers, &id).await?;
    tracing::debug!(action = %id, run_async = request.run_async, "remote call");
    let response = match action.call_with(args, options).await? {
        Outcome::Returned(value) => CallResponse::Returned(Json(Returned { value })),
        Outcome::Spawned(handle) => CallResponse::Accepted(Json(Accepted {
            invocation: Some(handle.id()),
        })),
        Outcome::Detached => CallResponse::Accepted(Json(Accepted { invocation: None })),
    };
    Ok(response)
}

/// `POST /api/actions/{id}/interrupt`: signal every running invocation.
///
/// Answers `{"interrupted": false}` if the action has no interrupt handler.
pub async fn interrupt(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<InterruptRequest>>,
) -> Result<InterruptResponse, ApiError> {
    let id: ActionId = id.parse()?;
    let Json(request) = body.unwrap_or_default();
    let args = Args {
        positional: request.args,
        keyword: request.kwargs,
    };

    let interrupted = resolve(&state, &headers, &id)
        .await?
        .interrupt(args)
        .await?;
    Ok(InterruptResponse::Ok(Json(Interrupted { interrupted })))
}
