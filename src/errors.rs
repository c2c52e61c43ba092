use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Error returned by every handler.
///
/// Clients only see the HTTP status and a `{"message": ...}` body; internal
/// details of 5xx errors are logged and replaced with a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("{0}")]
    InsufficientContent(String),

    #[error("Password reset token is invalid or has expired.")]
    InvalidOrExpiredToken,

    #[error("{0}")]
    Unauthenticated(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Not authorized, user not found")]
    IdentityNotFound,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("User already exists with this email")]
    DuplicateIdentity,

    #[error("AI did not return any content: {0}")]
    UpstreamEmpty(String),

    #[error("AI returned data in an unexpected format: {0}")]
    MalformedAiResponse(String),

    #[error("Failed to process your resume: {0}")]
    Extraction(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidState(_)
            | AppError::PreconditionFailed(_)
            | AppError::InsufficientContent(_)
            | AppError::InvalidOrExpiredToken => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_)
            | AppError::InvalidCredentials
            | AppError::IdentityNotFound => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::DuplicateIdentity => StatusCode::CONFLICT,
            AppError::UpstreamEmpty(_)
            | AppError::MalformedAiResponse(_)
            | AppError::Extraction(_)
            | AppError::Upstream(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }
}

/// True when a database error is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "A database error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "internal error");
                "An internal server error occurred".to_string()
            }
            other if status.is_server_error() => {
                tracing::error!(error = %other, "upstream failure");
                other.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
