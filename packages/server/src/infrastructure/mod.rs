//! Infrastructure layer: registry, codecs and collaborator implementations.

pub mod auth;
pub mod dto;
pub mod hub;
pub mod notifier;
pub mod repository;

pub use auth::JwtVerifier;
pub use hub::{ConnectionHandle, Hub};
pub use notifier::LoggingOfflineNotifier;
pub use repository::InMemoryMessageRepository;
