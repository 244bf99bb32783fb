use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::domain::shared::ApiEnvelope;

/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadCredentials(String),

    #[error("Refresh token is required")]
    RefreshTokenRequired,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadCredentials(_) | Self::RefreshTokenRequired => {
                StatusCode::BAD_REQUEST
            }
            Self::TokenInvalid
            | Self::TokenExpired
            | Self::InvalidRefreshToken
            | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            // The wire protocol reports already-exists conflicts as 403
            Self::Conflict(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing error message. Internal details never cross the wire.
    pub fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Implement IntoResponse for automatic conversion in handlers
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!(
            error = %self,
            status = %status.as_u16(),
            "Request failed"
        );

        let envelope: ApiEnvelope<serde_json::Value> =
            ApiEnvelope::failure(self.public_message(), status.as_u16());

        (status, Json(envelope)).into_response()
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
