//! Domain layer for the real-time delivery service.
//!
//! This module contains business types and the collaborator traits that are
//! independent of transport and storage concerns.

pub mod entity;
pub mod error;
pub mod repository;
pub mod value_object;

pub use entity::{ChannelMembership, ConnectionIdentity, NewMessage, Payload, StoredMessage};
pub use error::{AuthError, RepositoryError, ValueObjectError};
pub use repository::{ConnectionRegistry, IdentityVerifier, MessageRepository, OfflineNotifier};
pub use value_object::{ChannelId, ConnectionId, MessageContent, TeamId, Timestamp, UserId};
