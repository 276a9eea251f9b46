//! `GET /api/state`: what the controller is doing right now.

use axum::Json;
use axum::extract::State;

use flowmate_app::ports::ControlPort;
use flowmate_domain::command::StateReport;

use crate::state::AppState;

pub async fn get<C>(State(state): State<AppState<C>>) -> Json<StateReport>
where
    C: ControlPort + Send + Sync + 'static,
{
    Json(state.control.state())
}
