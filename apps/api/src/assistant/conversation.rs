use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use crate::models::conversation::ConversationMessage;

/// Append-only, ordered message history, one stream per conversation id.
#[async_trait]
pub trait ConversationLog: Send + Sync {
    async fn append(
        &self,
        conversation_id: &str,
        message: &ConversationMessage,
    ) -> Result<(), sqlx::Error>;

    /// Messages in append order. With `limit`, only the most recent `limit`.
    async fn history(
        &self,
        conversation_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ConversationMessage>, sqlx::Error>;
}

/// `ConversationLog` backed by PostgreSQL. Order is the `BIGSERIAL` id, i.e.
/// commit order of the appends, not request arrival order.
#[derive(Clone)]
pub struct PgConversationLog {
    pool: PgPool,
}

impl PgConversationLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationLog for PgConversationLog {
    async fn append(
        &self,
        conversation_id: &str,
        message: &ConversationMessage,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO conversations (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO conversation_messages (conversation_id, role, content) VALUES ($1, $2, $3)",
        )
        .bind(conversation_id)
        .bind(message.role)
        .bind(&message.content)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(
            "Added {} message to conversation {conversation_id}",
            message.role.as_str()
        );
        Ok(())
    }

    async fn history(
        &self,
        conversation_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ConversationMessage>, sqlx::Error> {
        // LIMIT NULL means no limit in Postgres.
        let limit = limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX));
        let messages = sqlx::query_as::<_, ConversationMessage>(
            r#"
            SELECT role, content FROM (
                SELECT id, role, content
                FROM conversation_messages
                WHERE conversation_id = $1
                ORDER BY id DESC
                LIMIT $2
            ) recent
            ORDER BY id ASC
            "#,
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        info!(
            "Retrieved {} messages for conversation {conversation_id}",
            messages.len()
        );
        Ok(messages)
    }
}
