use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Bookkeeping row linking one uploaded PDF to its object-store file and
/// document-store text. Never updated; removed with its owning user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeUpload {
    pub id: Uuid,
    pub object_key: String,
    pub document_key: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}
