//! WebSocket envelope exchanged with clients.
//!
//! ```json
//! {"type": "message", "content": "hi", "team_id": "7", "user_id": "42"}
//! ```
//!
//! Unknown fields are ignored on decode. `type` and `content` are required;
//! `team_id` and `user_id` may be omitted by clients because the server
//! always overwrites them with the identity bound to the connection.

use serde::{Deserialize, Serialize};

use crate::domain::{ConnectionIdentity, Payload, StoredMessage};

/// Envelope type of chat content
pub const MESSAGE_TYPE: &str = "message";

/// Wire envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub r#type: String,
    pub content: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub user_id: String,
    /// Set on server-originated pushes of stored messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Unix timestamp (milliseconds, UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl Envelope {
    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Encode into a payload ready for the outbound buffers.
    pub fn encode(&self) -> Result<Payload, serde_json::Error> {
        serde_json::to_string(self).map(Payload::from)
    }

    /// Overwrite the scoping fields with the identity bound to the connection.
    ///
    /// Client-supplied values for these two fields are never trusted.
    pub fn stamp(mut self, identity: &ConnectionIdentity) -> Self {
        self.team_id = identity.team_id.as_str().to_string();
        self.user_id = identity.user_id.as_str().to_string();
        self
    }

    /// Envelope pushed to recipients of a newly stored message.
    pub fn from_stored(message: &StoredMessage) -> Self {
        Self {
            r#type: MESSAGE_TYPE.to_string(),
            content: message.content.as_str().to_string(),
            team_id: message.team_id.as_str().to_string(),
            user_id: message.user_id.as_str().to_string(),
            channel_id: Some(message.channel_id.to_string()),
            message_id: Some(message.id.to_string()),
            created_at: Some(message.created_at.value()),
        }
    }

    /// Envelope a client sends: only type and content.
    pub fn chat(content: impl Into<String>) -> Self {
        Self {
            r#type: MESSAGE_TYPE.to_string(),
            content: content.into(),
            team_id: String::new(),
            user_id: String::new(),
            channel_id: None,
            message_id: None,
            created_at: None,
        }
    }
}
