//! HTTP and WebSocket surface of the coordinator.

pub mod http;
pub mod websocket;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::rooms::RoomRegistry;

/// Shared state for HTTP and WebSocket handlers.
pub struct AppState {
    pub rooms: RoomRegistry,
}

/// Build the coordinator's router: health routes plus the `/ws` upgrade.
pub fn router(state: Arc<AppState>) -> Router {
    http::routes()
        .route("/ws", get(websocket::ws_handler))
        .with_state(state)
}
