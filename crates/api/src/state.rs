use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::dispatcher::CommandDispatcher;
use crate::engine::registry::JobRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Process-wide job registry (also read directly by the health route).
    pub registry: Arc<JobRegistry>,
    /// Command dispatcher driving parser, registry, and runner.
    pub dispatcher: Arc<CommandDispatcher>,
}
