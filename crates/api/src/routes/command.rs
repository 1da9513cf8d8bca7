//! Route definitions for the command endpoint.
//!
//! The chat client knows exactly two paths, both mounted at root level:
//!
//! ```text
//! POST   /command     -> post_command
//! GET    /help        -> get_help
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::command;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/command", post(command::post_command))
        .route("/help", get(command::get_help))
}
