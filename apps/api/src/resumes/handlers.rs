//! Axum route handlers for the Resumes API.

use std::future::Future;
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeUpload;
use crate::resumes::extract::{extract_text, looks_like_pdf, PDF_CONTENT_TYPE};
use crate::resumes::storage::{
    document_key, download_link, get_document, object_key, purge_resume, put_document, put_object,
    MAX_LINK_EXPIRATION_SECS,
};
use crate::resumes::store::{get_upload, insert_upload};
use crate::state::AppState;

/// Multipart field carrying the PDF.
const RESUME_FIELD: &str = "resume";

#[derive(Debug, Serialize)]
pub struct ResumeUploadResponse {
    pub resume_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DownloadLinkQuery {
    #[serde(default = "default_expiration")]
    pub expiration: u64,
}

fn default_expiration() -> u64 {
    3600
}

#[derive(Debug, Serialize)]
pub struct DownloadLinkResponse {
    pub download_link: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeTextResponse {
    pub resume_id: Uuid,
    pub text: String,
}

struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

/// POST /v1/resumes
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeUploadResponse>), AppError> {
    let file = read_resume_field(multipart).await?;

    if file.content_type.as_deref() != Some(PDF_CONTENT_TYPE) || !looks_like_pdf(&file.bytes) {
        return Err(AppError::UnsupportedMediaType(
            "Only PDF files are supported".to_string(),
        ));
    }

    let text = extract_text(file.bytes.clone()).await?;

    let resume_id = Uuid::new_v4();
    let object_key = object_key(resume_id, &file.file_name);
    let document_key = document_key(resume_id);

    let upload = ResumeUpload {
        id: resume_id,
        object_key,
        document_key,
        file_name: file.file_name,
        created_at: chrono::Utc::now(),
    };

    // Nothing to undo if the object itself was not stored.
    put_object(
        &state.s3,
        &state.config.s3_bucket,
        &upload.object_key,
        file.bytes,
        PDF_CONTENT_TYPE,
    )
    .await?;

    let remaining = async {
        put_document(&state.redis, &upload.document_key, &text).await?;
        insert_upload(
            &state.db,
            upload.id,
            &upload.object_key,
            &upload.document_key,
            &upload.file_name,
        )
        .await?;
        Ok::<(), AppError>(())
    };
    or_purge(resume_id, remaining, purge_resume(&state, &upload)).await?;

    info!("Stored resume {resume_id} ({} chars of text)", text.len());
    Ok((
        StatusCode::CREATED,
        Json(ResumeUploadResponse { resume_id }),
    ))
}

/// GET /v1/resumes/:id
pub async fn handle_download_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DownloadLinkQuery>,
) -> Result<Json<DownloadLinkResponse>, AppError> {
    let expiration = validate_expiration(query.expiration)?;
    let upload = get_upload(&state.db, id).await?;
    let link = download_link(
        &state.s3,
        &state.config.s3_bucket,
        &upload.object_key,
        expiration,
    )
    .await?;
    Ok(Json(DownloadLinkResponse {
        download_link: link,
    }))
}

/// GET /v1/resumes/:id/text
pub async fn handle_resume_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeTextResponse>, AppError> {
    let upload = get_upload(&state.db, id).await?;
    let text = get_document(&state.redis, &upload.document_key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Text for resume {id} not found")))?;
    Ok(Json(ResumeTextResponse {
        resume_id: id,
        text,
    }))
}

/// Awaits the writes that follow a stored object; on failure runs `purge`
/// so no object or document is left without a `resume_uploads` row.
async fn or_purge<T>(
    resume_id: Uuid,
    write: impl Future<Output = Result<T, AppError>>,
    purge: impl Future<Output = ()>,
) -> Result<T, AppError> {
    match write.await {
        Ok(value) => Ok(value),
        Err(e) => {
            error!("Failed to store resume upload {resume_id}: {e}");
            purge.await;
            Err(e)
        }
    }
}

async fn read_resume_field(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("resume.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation(format!(
        "multipart field '{RESUME_FIELD}' is required"
    )))
}

fn validate_expiration(seconds: u64) -> Result<Duration, AppError> {
    if seconds == 0 || seconds > MAX_LINK_EXPIRATION_SECS {
        return Err(AppError::Validation(format!(
            "expiration must be between 1 and {MAX_LINK_EXPIRATION_SECS} seconds"
        )));
    }
    Ok(Duration::from_secs(seconds))
}
