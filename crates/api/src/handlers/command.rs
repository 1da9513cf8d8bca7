//! Handlers for the command endpoint.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::Reply;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CommandPayload {
    pub command: String,
}

/// POST /command
///
/// Evaluate one free-text command and return exactly one reply shape.
/// Domain-level failures (unknown command, already running, not found)
/// are 200 responses with `message`/`error` fields; non-2xx is reserved
/// for transport faults.
pub async fn post_command(
    State(state): State<AppState>,
    Json(payload): Json<CommandPayload>,
) -> AppResult<Json<Reply>> {
    if payload.command.trim().is_empty() {
        return Err(AppError::BadRequest("Command not provided.".into()));
    }

    let reply = state.dispatcher.handle(&payload.command).await?;
    Ok(Json(reply))
}

/// GET /help
///
/// Static usage instructions, same payload as the `commands` command.
pub async fn get_help() -> Json<Reply> {
    Json(Reply::instructions())
}
