//! Collaborator traits the use cases depend on.
//!
//! The concrete implementations live in the infrastructure layer; use cases
//! only see these traits (dependency inversion).

use async_trait::async_trait;

use super::{
    entity::{ChannelMembership, NewMessage, Payload, StoredMessage},
    error::{AuthError, RepositoryError},
    value_object::{ChannelId, TeamId, UserId},
};

/// Persistent store of channels, memberships and messages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Resolve the membership of `user_id` in `channel_id`.
    ///
    /// Returns `Ok(None)` when the channel exists but the user is not a member.
    async fn find_membership(
        &self,
        channel_id: ChannelId,
        user_id: &UserId,
    ) -> Result<Option<ChannelMembership>, RepositoryError>;

    /// Durably store a message and return it with its assigned id.
    async fn save_message(&self, message: NewMessage) -> Result<StoredMessage, RepositoryError>;

    /// List every member of a channel.
    async fn list_channel_members(
        &self,
        channel_id: ChannelId,
    ) -> Result<Vec<UserId>, RepositoryError>;
}

/// Presence queries and directed delivery offered by the live registry
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// True iff at least one live connection exists for (team, user).
    async fn is_user_connected(&self, team_id: &TeamId, user_id: &UserId) -> bool;

    /// Enqueue `payload` on every connection of (team, user) without blocking.
    ///
    /// Returns true iff at least one enqueue succeeded.
    async fn send_message_to_user(&self, team_id: &TeamId, user_id: &UserId, payload: Payload)
    -> bool;
}

/// Delivery path for recipients with no live connection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OfflineNotifier: Send + Sync {
    async fn notify_offline(&self, user_id: &UserId, message: &StoredMessage);
}

/// Verifies a bearer token and yields the authenticated user
#[cfg_attr(test, mockall::automock)]
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<UserId, AuthError>;
}
