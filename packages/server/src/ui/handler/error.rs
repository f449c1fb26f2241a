//! Mapping of use-case errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    domain::{AuthError, ValueObjectError},
    infrastructure::dto::http::ErrorDto,
    usecase::{AdmissionError, SendMessageError},
};

/// Error response with a `{"error": "..."}` body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorDto {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<AdmissionError> for ApiError {
    fn from(err: AdmissionError) -> Self {
        let status = match err {
            AdmissionError::MissingToken | AdmissionError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            AdmissionError::MissingTeam | AdmissionError::InvalidTeam(_) => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, err.to_string())
    }
}

impl From<ValueObjectError> for ApiError {
    fn from(err: ValueObjectError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, err.to_string())
    }
}

impl From<SendMessageError> for ApiError {
    fn from(err: SendMessageError) -> Self {
        let status = match err {
            SendMessageError::NotMember => StatusCode::FORBIDDEN,
            SendMessageError::ChannelNotFound(_) => StatusCode::NOT_FOUND,
            SendMessageError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_errors_map_to_status() {
        // テスト項目: 認証系は 401、チーム系は 400 に変換される
        assert_eq!(
            ApiError::from(AdmissionError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AdmissionError::Unauthorized(AuthError::Expired)).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AdmissionError::MissingTeam).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_send_message_errors_map_to_status() {
        // テスト項目: メンバー外は 403、チャンネルなしは 404
        assert_eq!(
            ApiError::from(SendMessageError::NotMember).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(SendMessageError::ChannelNotFound(1)).status(),
            StatusCode::NOT_FOUND
        );
    }
}
