//! UI layer: HTTP routes, WebSocket connections and process bootstrap.

pub mod connection;
pub mod handler;
mod runner;
mod signal;
pub mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use runner::{ServerError, run, serve};
pub use state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(handler::websocket_handler))
        .route("/api/health", get(handler::health_check))
        .route("/api/messages", post(handler::send_message))
        .route(
            "/api/teams/{team_id}/users/{user_id}/presence",
            get(handler::get_presence),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
