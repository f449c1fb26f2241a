//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{AuthError, RepositoryError};

/// Rejection of a connection before any socket upgrade
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Missing auth token")]
    MissingToken,

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("Team ID is required")]
    MissingTeam,

    #[error("Invalid team ID: {0}")]
    InvalidTeam(String),
}

/// Failure to relay one inbound frame; never fatal to the connection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("Failed to encode frame: {0}")]
    Encode(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    #[error("User is not a member of the channel")]
    NotMember,

    #[error("Channel not found: {0}")]
    ChannelNotFound(u64),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<RepositoryError> for SendMessageError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ChannelNotFound(id) => Self::ChannelNotFound(id),
            RepositoryError::Unavailable(msg) => Self::Store(msg),
        }
    }
}
