//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// UserId validation error
    #[error("UserId cannot be empty")]
    UserIdEmpty,

    /// UserId is not a non-negative integer
    #[error("UserId must be numeric (got: {0})")]
    UserIdNotNumeric(String),

    /// TeamId validation error
    #[error("TeamId cannot be empty")]
    TeamIdEmpty,

    /// TeamId is not a non-negative integer
    #[error("TeamId must be numeric (got: {0})")]
    TeamIdNotNumeric(String),

    /// MessageContent validation error
    #[error("MessageContent cannot be empty")]
    MessageContentEmpty,

    /// MessageContent too long error
    #[error("MessageContent cannot exceed {max} bytes (got {actual})")]
    MessageContentTooLong { max: usize, actual: usize },
}

/// Errors returned by the persistent message store
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Channel not found: {0}")]
    ChannelNotFound(u64),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors returned by token verification
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token has no usable user_id claim")]
    MissingUserId,
}
