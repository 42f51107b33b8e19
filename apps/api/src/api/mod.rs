// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};

use crate::agents::ManagerAgent;
use crate::config::ServerConfig;
use crate::infrastructure::hub::BroadcastHub;

pub mod contracts;
pub mod errors;
pub mod handlers;

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub hub: Arc<BroadcastHub>,
    pub manager: ManagerAgent,
    pub voice_delay: Duration,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        let hub = Arc::new(BroadcastHub::new());
        Self {
            manager: ManagerAgent::new(hub.clone(), config.step_interval),
            hub,
            voice_delay: config.voice_delay,
        }
    }
}

/// Routes for the broadcast channel and the collaborator endpoints
pub fn router(state: AppState) -> Router {
    use handlers::{agents, execute, socket, voice};

    Router::new()
        // Broadcast channel
        .route("/", get(socket::ws_handler))
        .route("/ws", get(socket::ws_handler))
        // Health check
        .route("/health", get(agents::health_check))
        // Collaborator endpoints
        .route(
            "/api/agents",
            get(agents::list_agents).post(agents::submit_command),
        )
        .route("/api/execute", post(execute::execute_command))
        .route("/api/voice/process", post(voice::process_voice))
        .with_state(state)
}
