//! POST /v1/system/reset: wipes records, conversations and stored resumes.

use axum::{extract::State, Json};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::resumes::storage::{delete_documents, delete_prefix, DOCUMENT_PREFIX, OBJECT_PREFIX};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub removed_objects: usize,
    pub removed_documents: usize,
}

/// POST /v1/system/reset
///
/// Disabled unless `ENABLE_SYSTEM_RESET` is set.
pub async fn handle_reset(State(state): State<AppState>) -> Result<Json<ResetResponse>, AppError> {
    if !state.config.enable_system_reset {
        warn!("Rejected system reset: ENABLE_SYSTEM_RESET is off");
        return Err(AppError::Forbidden);
    }

    truncate_all(&state.db).await?;
    let removed_documents = delete_documents(&state.redis, DOCUMENT_PREFIX).await?;
    let removed_objects = delete_prefix(&state.s3, &state.config.s3_bucket, OBJECT_PREFIX).await?;

    info!(
        "System reset: database truncated, {removed_documents} documents and {removed_objects} objects removed"
    );
    Ok(Json(ResetResponse {
        success: true,
        removed_objects,
        removed_documents,
    }))
}

async fn truncate_all(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "TRUNCATE conversation_messages, conversations, tasks, users, resume_uploads RESTART IDENTITY CASCADE",
    )
    .execute(pool)
    .await?;
    Ok(())
}
