use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::RecordError;
use crate::models::resume::ResumeUpload;

pub async fn insert_upload(
    pool: &PgPool,
    id: Uuid,
    object_key: &str,
    document_key: &str,
    file_name: &str,
) -> Result<ResumeUpload, RecordError> {
    Ok(sqlx::query_as::<_, ResumeUpload>(
        r#"
        INSERT INTO resume_uploads (id, object_key, document_key, file_name)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(object_key)
    .bind(document_key)
    .bind(file_name)
    .fetch_one(pool)
    .await?)
}

pub async fn get_upload(pool: &PgPool, id: Uuid) -> Result<ResumeUpload, RecordError> {
    sqlx::query_as::<_, ResumeUpload>("SELECT * FROM resume_uploads WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RecordError::ResumeNotFound(id))
}
