//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use flowmate_app::ports::ControlPort;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the API under `/api` next to a `/health` probe. Includes a
/// [`TraceLayer`] that logs each HTTP request/response at the `DEBUG`
/// level.
pub fn build<C>(state: AppState<C>) -> Router
where
    C: ControlPort + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
