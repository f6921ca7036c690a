//! Error types for lhd-web

use crate::auth::AuthError;
use crate::spotify::SpotifyError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// No session, or the upstream token was rejected (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// OAuth failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Spotify API failure
    #[error(transparent)]
    Spotify(#[from] SpotifyError),

    /// lhd-common error
    #[error("Common error: {0}")]
    Common(#[from] lhd_common::Error),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Auth(AuthError::Denied(_)) => (StatusCode::UNAUTHORIZED, "AUTH_DENIED"),
            ApiError::Auth(AuthError::StateMismatch) | ApiError::Auth(AuthError::MissingCode) => {
                (StatusCode::BAD_REQUEST, "AUTH_INVALID_CALLBACK")
            }
            ApiError::Auth(AuthError::Storage(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "TOKEN_STORAGE_ERROR")
            }
            ApiError::Auth(_) => (StatusCode::BAD_GATEWAY, "AUTH_UPSTREAM_ERROR"),
            ApiError::Spotify(SpotifyError::Unauthorized(_)) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
            }
            ApiError::Spotify(SpotifyError::RateLimitExceeded { .. }) => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED")
            }
            ApiError::Spotify(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::Common(lhd_common::Error::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST")
            }
            ApiError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "Request failed");
        } else {
            tracing::debug!(code = error_code, error = %self, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
