//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod commands;
pub mod sse;
pub mod state;

use axum::Router;
use axum::routing::{get, post};

use flowmate_app::ports::ControlPort;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<C>() -> Router<AppState<C>>
where
    C: ControlPort + Send + Sync + 'static,
{
    Router::new()
        .route("/commands", post(commands::execute::<C>))
        .route("/state", get(state::get::<C>))
        .route("/events/stream", get(sse::stream::<C>))
}
