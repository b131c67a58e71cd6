use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::assistant::AssistantError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Document store error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("S3 error: {0}")]
    S3(String),

    #[error(transparent)]
    Assistant(#[from] AssistantError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Failures of the record store mutations shared by the CRUD endpoints and
/// the assistant's tool calls.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    #[error("Assignee {0} not found")]
    AssigneeNotFound(Uuid),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Resume {0} not found")]
    ResumeNotFound(Uuid),

    #[error("User with this email already exists")]
    EmailTaken,

    #[error("User {0} is still assigned to tasks")]
    UserHasTasks(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RecordError {
    /// True for failures caused by the caller's input rather than the store.
    pub fn is_validation(&self) -> bool {
        !matches!(self, RecordError::Database(_))
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::TaskNotFound(_)
            | RecordError::AssigneeNotFound(_)
            | RecordError::UserNotFound(_)
            | RecordError::ResumeNotFound(_) => AppError::NotFound(err.to_string()),
            RecordError::EmailTaken | RecordError::UserHasTasks(_) => {
                AppError::Validation(err.to_string())
            }
            RecordError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                msg.clone(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DOCUMENT_STORE_ERROR",
                    "A document store error occurred".to_string(),
                )
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            // Every assistant failure is a failed turn, whatever its kind.
            AppError::Assistant(e) => {
                tracing::error!("Error in chat with assistant: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ASSISTANT_ERROR",
                    format!("Failed to process chat: {e}"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
