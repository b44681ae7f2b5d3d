// HTTP and WebSocket APIs

mod decisions;
mod devices;
mod error;
mod simulate;
pub mod websocket;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::state::ServerState;

pub use error::ApiError;

/// Create the API router with every endpoint mounted.
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route("/api/simulate", post(simulate::simulate))
        .route("/api/devices", get(devices::list_devices))
        .route("/api/devices/:id/status", post(devices::update_status))
        .route("/api/decisions", get(decisions::pending_decisions))
        .route("/api/ws", get(websocket::ws_handler))
        .with_state(Arc::new(state))
}
