//! End-to-end smoke tests for the full flowmated stack.
//!
//! Each test wires the complete application (in-memory `SQLite`, the
//! virtual console, the real controller and axum router) and exercises the
//! HTTP layer via `tower::ServiceExt::oneshot`; no TCP port is bound.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use flowmate_adapter_http_axum::router;
use flowmate_adapter_http_axum::state::AppState;
use flowmate_adapter_storage_sqlite_sqlx::{Config, SqliteSettingsRepository};
use flowmate_adapter_virtual::{
    SoftphoneScript, TracingCuePlayer, VirtualCrmConsole, VirtualSoftphone,
};
use flowmate_app::call_loop::CallLoop;
use flowmate_app::controller::Controller;
use flowmate_app::event_bus::InProcessEventBus;
use flowmate_app::hygiene::ConsoleHygiene;
use flowmate_app::next_call::NextCallAction;
use flowmate_app::ports::SettingsRepository;
use flowmate_domain::next_call::NextCallPlan;
use flowmate_domain::retry::RetryPolicy;
use flowmate_domain::settings::Settings;
use flowmate_domain::surface::Surface;
use flowmate_domain::trigger::TriggerPolicy;
use tower::ServiceExt;

struct Harness {
    app: axum::Router,
    crm: Arc<VirtualCrmConsole>,
    softphone: Arc<VirtualSoftphone>,
    store: SqliteSettingsRepository,
}

/// Build a fully-wired CRM-surface router backed by an in-memory database.
async fn harness() -> Harness {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");

    let event_bus = Arc::new(InProcessEventBus::new(256));
    let softphone = Arc::new(VirtualSoftphone::new(SoftphoneScript {
        answer_after: None,
        ..SoftphoneScript::default()
    }));
    let crm = Arc::new(VirtualCrmConsole::new());

    let plan = NextCallPlan {
        cancel_renew_repeat: RetryPolicy::new(2, Duration::from_millis(5)),
        ..NextCallPlan::default()
    };
    let action = Arc::new(NextCallAction::new(
        Arc::clone(&softphone),
        Arc::clone(&event_bus),
        plan,
    ));
    let call_loop = CallLoop::new(
        Arc::clone(&softphone),
        TracingCuePlayer,
        action,
        Settings::default().automation_config(TriggerPolicy::Standard),
        Duration::from_millis(10),
    );

    let controller = Controller::new(
        Surface::detect("acme.lightning.force.com", ""),
        TriggerPolicy::Standard,
        SqliteSettingsRepository::new(db.pool().clone()),
        Arc::clone(&event_bus),
    )
    .with_automation(call_loop)
    .with_hygiene(ConsoleHygiene::new(Arc::clone(&crm)));
    controller.bootstrap().await.expect("bootstrap should succeed");

    Harness {
        app: router::build(AppState::new(Arc::new(controller), event_bus)),
        crm,
        softphone,
        store: SqliteSettingsRepository::new(db.pool().clone()),
    }
}

fn command(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/commands")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let harness = harness().await;

    let response = harness
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn should_report_defaults_on_crm_surface() {
    let harness = harness().await;

    let (status, json) = send(
        &harness.app,
        Request::builder()
            .uri("/api/state")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["surface"], "crm");
    assert_eq!(json["automation"]["delay"], 3);
    assert_eq!(json["automation"]["loopRunning"], false);
    assert_eq!(json["hygiene"]["tabLimit"], 10);
}

#[tokio::test]
async fn should_persist_applied_settings() {
    let harness = harness().await;

    let (status, json) = send(
        &harness.app,
        command(r#"{"type":"APPLY_SETTINGS","payload":{"asmDelay":7.9,"tabLimit":2}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["reply"], "ok");

    let (_, state) = send(&harness.app, command(r#"{"type":"GET_STATE"}"#)).await;
    assert_eq!(state["reply"], "state");
    assert_eq!(state["state"]["automation"]["delay"], 7);
    assert_eq!(state["state"]["hygiene"]["tabLimit"], 2);

    let stored = harness.store.load().await.unwrap();
    assert_eq!(stored.asm_delay, Some(7.0));
    assert_eq!(stored.tab_limit, Some(2.0));
}

#[tokio::test]
async fn should_run_next_call_sequence_against_virtual_softphone() {
    let harness = harness().await;

    let (status, json) = send(&harness.app, command(r#"{"type":"ASM_NEXT_CALL"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["reply"], "next_call");
    assert_eq!(json["outcome"]["outcome"], "completed");
    assert_eq!(json["outcome"]["report"]["ended_interaction"], true);
    assert_eq!(json["outcome"]["report"]["submit"], "clicked");
    assert_eq!(harness.softphone.calls_completed(), 1);
}

#[tokio::test]
async fn should_kill_tabs_on_crm_console() {
    let harness = harness().await;
    for title in ["a", "b", "c"] {
        harness.crm.open_tab(title);
    }

    let (status, json) = send(&harness.app, command(r#"{"type":"SF_KILL_TABS"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["reply"], "ok");
    assert!(harness.crm.tabs().is_empty());
}

#[tokio::test]
async fn should_start_and_stop_loops() {
    let harness = harness().await;

    send(&harness.app, command(r#"{"type":"ASM_START_LOOP"}"#)).await;
    send(&harness.app, command(r#"{"type":"SF_START_TOAST_LOOP"}"#)).await;
    let (_, state) = send(&harness.app, command(r#"{"type":"GET_STATE"}"#)).await;
    assert_eq!(state["state"]["automation"]["loopRunning"], true);
    assert_eq!(state["state"]["hygiene"]["toastLoop"], true);

    send(&harness.app, command(r#"{"type":"RESET_WIDGETS"}"#)).await;
    let (_, state) = send(&harness.app, command(r#"{"type":"GET_STATE"}"#)).await;
    assert_eq!(state["state"]["automation"]["loopRunning"], false);
    assert_eq!(state["state"]["hygiene"]["toastLoop"], false);
}

#[tokio::test]
async fn should_reject_unknown_command() {
    let harness = harness().await;

    let (status, _) = send(&harness.app, command(r#"{"type":"SELF_DESTRUCT"}"#)).await;

    assert!(status.is_client_error());
}
