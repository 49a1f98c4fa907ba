//! Application error types for robust error handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Username already taken: {0}")]
    DuplicateUser(String),

    /// Unknown user and wrong password are deliberately the same variant.
    #[error("Invalid username or password")]
    Authentication,

    #[error("Session missing or expired")]
    SessionExpired,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::SessionExpired => return Redirect::to("/login").into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::DuplicateUser(_) => {
                (StatusCode::CONFLICT, "Username already taken".to_string())
            }
            AppError::Authentication => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Redis(e) => {
                tracing::error!(error = %e, "session store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Session store unavailable".to_string(),
                )
            }
            AppError::Config(_)
            | AppError::Db(_)
            | AppError::Serialization(_)
            | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
