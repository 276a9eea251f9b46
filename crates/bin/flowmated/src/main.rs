//! # flowmated: flowmate daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Open the settings database and run migrations
//! - Detect the surface and attach the widgets it supports
//! - Apply stored settings, then serve the HTTP API
//! - Stop every loop on graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use flowmate_adapter_http_axum::router;
use flowmate_adapter_http_axum::state::AppState;
use flowmate_adapter_storage_sqlite_sqlx::SqliteSettingsRepository;
use flowmate_adapter_virtual::{TracingCuePlayer, VirtualCrmConsole, VirtualSoftphone};
use flowmate_app::call_loop::CallLoop;
use flowmate_app::controller::Controller;
use flowmate_app::event_bus::InProcessEventBus;
use flowmate_app::hygiene::ConsoleHygiene;
use flowmate_app::next_call::NextCallAction;
use flowmate_domain::next_call::NextCallPlan;
use flowmate_domain::settings::Settings;
use flowmate_domain::surface::Surface;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter)?;
    for ignored in config.ignored_overrides() {
        tracing::warn!(key = ignored.key, value = %ignored.value, "unparsable override, ignored");
    }

    // Storage
    let db = flowmate_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .with_context(|| format!("failed to open database {}", config.database_url()))?;
    let store = SqliteSettingsRepository::new(db.pool().clone());

    // Event bus
    let event_bus = Arc::new(InProcessEventBus::new(256));

    // Console
    let surface = Surface::detect(&config.console.host, &config.console.frame_name);
    let softphone = Arc::new(VirtualSoftphone::new(
        config.simulation.script(config.automation.disposition_id),
    ));
    let crm = Arc::new(VirtualCrmConsole::new());
    let activity = crm.spawn_activity(config.simulation.tab_every(), config.simulation.toast_every());

    // Widgets
    let policy = config.automation.trigger_policy;
    let action = Arc::new(NextCallAction::new(
        Arc::clone(&softphone),
        Arc::clone(&event_bus),
        NextCallPlan::with_disposition(config.automation.disposition_id),
    ));
    let call_loop = CallLoop::new(
        Arc::clone(&softphone),
        TracingCuePlayer,
        action,
        Settings::default().automation_config(policy),
        config.automation.poll_interval(),
    );
    let hygiene = ConsoleHygiene::new(Arc::clone(&crm));

    let controller = Arc::new(
        Controller::new(surface, policy, store, Arc::clone(&event_bus))
            .with_automation(call_loop)
            .with_hygiene(hygiene),
    );
    controller
        .bootstrap()
        .await
        .context("failed to apply stored settings")?;

    // HTTP
    let app = router::build(AppState::new(Arc::clone(&controller), event_bus));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, ?surface, ?policy, "flowmated listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    controller.shutdown().await;
    activity.abort();
    tracing::info!("flowmated stopped");
    Ok(())
}

fn init_tracing(filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(filter)
        .with_context(|| format!("invalid log filter {filter:?}"))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
