//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use hubbub_shared::time::millis_to_rfc3339;

use crate::{
    domain::{ChannelId, MessageContent, TeamId, UserId},
    infrastructure::dto::http::{
        HealthDto, PresenceDto, SendMessageRequestDto, SendMessageResponseDto,
    },
    ui::state::AppState,
};

use super::{ApiError, bearer_token};

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        connections: state.hub.connection_count().await,
        teams: state.hub.team_count().await,
    })
}

/// Whether a user currently has a live connection in a team
pub async fn get_presence(
    State(state): State<Arc<AppState>>,
    Path((team_id, user_id)): Path<(String, String)>,
) -> Result<Json<PresenceDto>, ApiError> {
    let team_id = TeamId::new(team_id)?;
    let user_id = UserId::new(user_id)?;
    let online = state.hub.is_user_connected(&team_id, &user_id).await;

    Ok(Json(PresenceDto {
        team_id: team_id.as_str().to_string(),
        user_id: user_id.as_str().to_string(),
        online,
    }))
}

/// Store a message and fan it out to the channel members.
///
/// The response only confirms persistence; live delivery is best-effort.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<SendMessageRequestDto>, JsonRejection>,
) -> Result<Json<SendMessageResponseDto>, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Missing auth token"))?;
    let sender = state.verifier.verify(token)?;

    let Json(request) = body.map_err(|e| {
        tracing::warn!("Failed to decode request body: {}", e);
        ApiError::new(StatusCode::BAD_REQUEST, "Invalid request body")
    })?;
    let content = MessageContent::new(request.content)?;

    let stored = state
        .send_message_usecase()
        .execute(sender, ChannelId::new(request.channel_id), content)
        .await
        .inspect_err(|e| tracing::warn!("Failed to send message: {}", e))?;

    Ok(Json(SendMessageResponseDto {
        message: "Message sent successfully".to_string(),
        message_id: stored.id,
        created_at: millis_to_rfc3339(stored.created_at.value()),
    }))
}
