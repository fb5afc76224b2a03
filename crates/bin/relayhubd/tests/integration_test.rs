//! End-to-end smoke tests for the full relayhubd stack.
//!
//! Each test wires a real hub with the virtual integration's actions and the
//! real axum router, and exercises the HTTP layer via
//! `tower::ServiceExt::oneshot`; no TCP port is bound.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use relayhub_adapter_http_axum::router;
use relayhub_adapter_http_axum::state::AppState;
use relayhub_adapter_virtual::{VirtualConfig, VirtualIntegration};
use relayhub_app::dashboard::DashboardOptions;
use relayhub_app::hub::{Hub, HubConfig};
use relayhub_app::ports::SignalSource;
use relayhub_domain::id::SignalId;
use relayhub_domain::link::LinkConfig;
use relayhub_domain::system::ExitReason;
use serde_json::{Value, json};
use tower::ServiceExt;

struct Stack {
    app: axum::Router,
    hub: Arc<Hub>,
    integration: VirtualIntegration,
}

/// Build a fully-wired router over a hub with the virtual devices.
fn stack() -> Stack {
    let hub = Arc::new(
        Hub::new(HubConfig {
            tick: Duration::from_millis(20),
            ..HubConfig::default()
        })
        .expect("hub should build"),
    );
    let integration =
        VirtualIntegration::new(VirtualConfig::default()).expect("virtual integration");
    for action in integration.actions().expect("virtual actions") {
        hub.register(action).expect("virtual action should register");
    }
    let app = router::build(AppState::new(Arc::clone(&hub)));
    Stack {
        app,
        hub,
        integration,
    }
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let resp = stack().app.oneshot(get("/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_list_virtual_and_system_actions() {
    let resp = stack().app.oneshot(get("/api/actions")).await.unwrap();

    let body = json(resp).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|info| info["id"].as_str())
        .collect();
    for id in ["app.reboot", "app.stop", "fan.run", "light.turn_off", "light.turn_on"] {
        assert!(ids.contains(&id), "missing {id}");
    }
}

#[tokio::test]
async fn should_switch_light_and_emit_result_signal() {
    let Stack {
        app, integration, ..
    } = stack();

    let resp = app
        .clone()
        .oneshot(send("POST", "/api/actions/light.turn_on/call", &json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json(resp).await, json!({"value": {"on": true}}));
    assert!(integration.light().is_on());

    let resp = app.oneshot(get("/api/signals")).await.unwrap();
    assert_eq!(json(resp).await["action.light.turn_on"], json!({"on": true}));
}

#[tokio::test]
async fn should_run_and_interrupt_fan_over_http() {
    let Stack {
        app, integration, ..
    } = stack();

    let resp = app
        .clone()
        .oneshot(send(
            "POST",
            "/api/actions/fan.run/call",
            &json!({"kwargs": {"speed": 3}, "run_async": true}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(integration.fan().speed(), 3);

    let resp = app
        .oneshot(send("POST", "/api/actions/fan.run/interrupt", &json!({})))
        .await
        .unwrap();
    assert_eq!(json(resp).await, json!({"interrupted": true}));

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(integration.fan().speed(), 0);
}

// ---------------------------------------------------------------------------
// Signals and links
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_invoke_linked_action_when_signal_is_published() {
    let Stack {
        app,
        hub,
        integration,
    } = stack();
    hub.handle(&"light.turn_on".parse().unwrap())
        .unwrap()
        .link_to(SignalId::gpio(17), LinkConfig::builder().build());
    hub.start().await.unwrap();

    let resp = app
        .clone()
        .oneshot(send("PUT", "/api/signals/gpio.17", &json!({"value": true})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    tokio::time::timeout(Duration::from_secs(1), async {
        while !integration.light().is_on() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("light should be switched on by the link");

    let resp = app.oneshot(get("/api/links")).await.unwrap();
    assert_eq!(json(resp).await[0]["target"], json!("light.turn_on"));
    hub.shutdown().await;
}

// ---------------------------------------------------------------------------
// Dashboard and schedules
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_serve_dashboard_controls_and_schedules() {
    let Stack { app, hub, .. } = stack();
    let fan = hub.handle(&"fan.run".parse().unwrap()).unwrap();
    fan.link_to_dashboard(DashboardOptions::default().label("Fan").group("Living room"));
    fan.run_every(1)
        .days()
        .at("07:00".parse().unwrap())
        .run(relayhub_domain::value::Args::new().kwarg("duration_secs", 600))
        .unwrap();

    let resp = app.clone().oneshot(get("/api/dashboard")).await.unwrap();
    let controls = json(resp).await;
    assert_eq!(controls[0]["label"], json!("Fan"));
    assert_eq!(controls[0]["action"]["interruptible"], json!(true));

    let resp = app.oneshot(get("/api/schedules")).await.unwrap();
    let schedules = json(resp).await;
    assert_eq!(schedules[0]["action"], json!("fan.run"));
    assert_eq!(schedules[0]["recurrence"], json!("every day at 07:00"));
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_request_exit_through_system_action() {
    let Stack { app, hub, .. } = stack();
    let exit = hub.wait_for_exit();

    let resp = app
        .oneshot(send("POST", "/api/actions/app.restart/call", &json!({})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        tokio::time::timeout(Duration::from_secs(1), exit).await.unwrap(),
        ExitReason::Restart
    );
}
