//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequestDto {
    pub channel_id: u64,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageResponseDto {
    pub message: String,
    pub message_id: u64,
    pub created_at: String, // ISO 8601
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceDto {
    pub team_id: String,
    pub user_id: String,
    pub online: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub connections: usize,
    pub teams: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}
