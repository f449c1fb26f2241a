//! WebSocket upgrade handler.

use std::sync::Arc;

use axum::{
    extract::{Query, State, ws::WebSocketUpgrade},
    http::HeaderMap,
    response::Response,
};
use serde::Deserialize;

use crate::ui::{connection, state::AppState};

use super::{ApiError, bearer_token};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub team_id: Option<String>,
    /// Fallback for clients that cannot set headers on the upgrade request
    pub token: Option<String>,
}

/// `GET /ws?team_id=<team>`
///
/// Identity and team are resolved before the upgrade; a rejected request
/// never reaches the registry.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers).or(query.token.as_deref());

    let identity = state
        .admit_connection_usecase()
        .execute(token, query.team_id.as_deref())
        .inspect_err(|e| tracing::warn!("WebSocket admission rejected: {}", e))?;

    tracing::info!(
        team_id = %identity.team_id,
        user_id = %identity.user_id,
        "WebSocket connection admitted"
    );

    let max_size = state.connection.keepalive.max_message_size;
    Ok(ws
        .max_message_size(max_size)
        .max_frame_size(max_size)
        .on_upgrade(move |socket| connection::serve(socket, state, identity)))
}
