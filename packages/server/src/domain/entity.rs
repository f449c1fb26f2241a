//! Core domain models for real-time delivery.

use std::sync::Arc;

use super::value_object::{ChannelId, MessageContent, TeamId, Timestamp, UserId};

/// Serialized frame queued for one connection.
///
/// Shared between every connection a fan-out reaches, so cloning is cheap.
pub type Payload = Arc<str>;

/// Identity bound to a connection at admission.
///
/// Both fields come from verified, out-of-band sources and never change for
/// the lifetime of the connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionIdentity {
    pub user_id: UserId,
    pub team_id: TeamId,
}

impl ConnectionIdentity {
    pub fn new(user_id: UserId, team_id: TeamId) -> Self {
        Self { user_id, team_id }
    }
}

/// A user's membership in a channel, resolved from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMembership {
    pub channel_id: ChannelId,
    pub team_id: TeamId,
    pub user_id: UserId,
}

/// A message that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub channel_id: ChannelId,
    pub team_id: TeamId,
    pub user_id: UserId,
    pub content: MessageContent,
    pub created_at: Timestamp,
}

/// A durably stored message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// Store-assigned identifier
    pub id: u64,
    pub channel_id: ChannelId,
    pub team_id: TeamId,
    pub user_id: UserId,
    pub content: MessageContent,
    pub created_at: Timestamp,
}

impl StoredMessage {
    pub fn from_new(id: u64, message: NewMessage) -> Self {
        Self {
            id,
            channel_id: message.channel_id,
            team_id: message.team_id,
            user_id: message.user_id,
            content: message.content,
            created_at: message.created_at,
        }
    }
}
