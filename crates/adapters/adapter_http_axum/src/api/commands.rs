//! `POST /api/commands`: forward one panel command to the controller.

use axum::Json;
use axum::extract::State;

use flowmate_app::ports::ControlPort;
use flowmate_domain::command::{Command, CommandReply};

use crate::error::ApiError;
use crate::state::AppState;

/// Execute a command such as `{"type": "ASM_SET_DELAY", "value": 5}`.
///
/// Unknown command types are rejected by the JSON extractor before they
/// reach the controller.
pub async fn execute<C>(
    State(state): State<AppState<C>>,
    Json(command): Json<Command>,
) -> Result<Json<CommandReply>, ApiError>
where
    C: ControlPort + Send + Sync + 'static,
{
    tracing::debug!(?command, "command received");
    let reply = state.control.execute(command).await?;
    Ok(Json(reply))
}
