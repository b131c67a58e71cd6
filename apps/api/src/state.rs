use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::assistant::conversation::ConversationLog;
use crate::config::Config;
use crate::kanban::store::RecordStore;
use crate::llm_client::ChatModel;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Document store holding extracted resume text.
    pub redis: RedisClient,
    pub s3: S3Client,
    pub config: Config,
    /// Record store the assistant mutates tasks through. Default: PgRecordStore.
    pub records: Arc<dyn RecordStore>,
    /// Per-conversation message log. Default: PgConversationLog.
    pub conversations: Arc<dyn ConversationLog>,
    /// Completion provider. Default: LlmClient against an OpenAI-compatible endpoint.
    pub llm: Arc<dyn ChatModel>,
}
