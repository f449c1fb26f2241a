use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("invalid token header: {0}")]
    InvalidToken(String),

    #[error("line editor error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}
