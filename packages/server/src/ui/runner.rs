//! Server startup and routing.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{domain::RoomRegistry, infrastructure::registry::InMemoryRoomRegistry};

use super::{
    config::ServerConfig,
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Build the router with all endpoints.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(get_rooms))
        .route("/api/rooms/{room_name}", get(get_room_detail))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until a shutdown signal arrives.
pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry: Arc<dyn RoomRegistry> = InMemoryRoomRegistry::new(config.registry_config()?);
    tracing::info!(
        "Lobby '{}' ready (case-insensitive room names: {})",
        config.lobby_name,
        config.case_insensitive_room_names
    );

    let state = Arc::new(AppState { registry });
    let app = build_app(state);

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
