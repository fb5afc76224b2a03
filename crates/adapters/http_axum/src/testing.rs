//! Helpers shared by the handler tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use serde_json::{Value, json};

use relayhub_app::action::{Action, Invocation};
use relayhub_app::hub::{Hub, HubConfig};
use relayhub_domain::action::ParamSpec;

use crate::router;
use crate::state::AppState;

async fn add(invocation: Invocation) -> anyhow::Result<Value> {
    let a = invocation.param("a").and_then(Value::as_i64).unwrap_or_default();
    let b = invocation.param("b").and_then(Value::as_i64).unwrap_or_default();
    Ok(json!(a + b))
}

async fn hold(invocation: Invocation) -> anyhow::Result<Value> {
    invocation.exit_flag().wait().await;
    Ok(json!("released"))
}

/// Router over a hub with `math.add(a, b=0)` and an interruptible
/// `test.hold` registered.
pub(crate) fn app() -> (Router, Arc<Hub>) {
    let hub = Arc::new(Hub::new(HubConfig::default()).unwrap());
    hub.register(
        Action::builder("add")
            .controller("math")
            .param(ParamSpec::required("a"))
            .param(ParamSpec::optional("b", 0))
            .work(add)
            .build()
            .unwrap(),
    )
    .unwrap();
    hub.register(
        Action::builder("hold")
            .controller("test")
            .work(hold)
            .on_interrupt(|_| async { Ok(()) })
            .build()
            .unwrap(),
    )
    .unwrap();
    (router::build(AppState::new(Arc::clone(&hub))), hub)
}

pub(crate) fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub(crate) fn send(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
