use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::services::LedgerError;
use crate::services::auth_service::AuthError;
use crate::web::validation::ValidationError;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
pub const MISSING_TOKEN_MESSAGE: &str = "Access token required";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";
pub const BATCH_START_FAILED_MESSAGE: &str = "An error occurred while starting the batch";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Missing access token")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Expired token")]
    ExpiredToken,
    #[error("Batch could not be started: {0}")]
    BatchStartFailed(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                json!({ "status": "error", "message": err.message, "errors": err.errors }),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": INVALID_CREDENTIALS_MESSAGE }),
            ),
            AppError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": MISSING_TOKEN_MESSAGE }),
            ),
            AppError::InvalidToken | AppError::ExpiredToken => (
                StatusCode::FORBIDDEN,
                json!({ "message": INVALID_TOKEN_MESSAGE }),
            ),
            AppError::BatchStartFailed(detail) => {
                error!(detail = %detail, "Batch job could not be recorded.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "status": "error", "message": BATCH_START_FAILED_MESSAGE }),
                )
            }
            AppError::InternalServerError(detail) => {
                // Detail stays in the logs.
                error!(detail = %detail, "Request failed with an internal error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "status": "error", "message": INTERNAL_ERROR_MESSAGE }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::MissingToken => AppError::MissingToken,
            AuthError::InvalidToken => AppError::InvalidToken,
            AuthError::ExpiredToken => AppError::ExpiredToken,
            AuthError::PasswordVerification(msg) | AuthError::TokenCreation(msg) => {
                AppError::InternalServerError(msg)
            }
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError::BatchStartFailed(err.to_string())
    }
}
