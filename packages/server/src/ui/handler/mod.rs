//! Handler modules for HTTP and WebSocket endpoints.

pub mod error;
pub mod http;
pub mod websocket;

use axum::http::{HeaderMap, header::AUTHORIZATION};

pub use error::ApiError;

// Re-export HTTP handlers
pub use http::{get_presence, health_check, send_message};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;

/// Token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
