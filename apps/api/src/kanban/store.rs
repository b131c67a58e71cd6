use async_trait::async_trait;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::RecordError;
use crate::models::task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
use crate::models::user::User;
use crate::users::store::list_users;

/// Optional filters for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub assignee_id: Option<Uuid>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
}

/// The record store as seen by the assistant: a read of the whole board plus
/// the three task mutations it may perform.
///
/// Every mutation is its own transaction. There is no transaction spanning
/// several calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn users(&self) -> Result<Vec<User>, RecordError>;
    async fn tasks(&self) -> Result<Vec<Task>, RecordError>;
    async fn create_task(&self, new: NewTask) -> Result<Task, RecordError>;
    async fn edit_task(&self, id: Uuid, patch: TaskPatch) -> Result<Task, RecordError>;
    async fn delete_task(&self, id: Uuid) -> Result<(), RecordError>;
}

/// `RecordStore` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn users(&self) -> Result<Vec<User>, RecordError> {
        list_users(&self.pool).await
    }

    async fn tasks(&self) -> Result<Vec<Task>, RecordError> {
        list_tasks(&self.pool, &TaskFilter::default()).await
    }

    async fn create_task(&self, new: NewTask) -> Result<Task, RecordError> {
        create_task(&self.pool, &new).await
    }

    async fn edit_task(&self, id: Uuid, patch: TaskPatch) -> Result<Task, RecordError> {
        edit_task(&self.pool, id, &patch).await
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), RecordError> {
        delete_task(&self.pool, id).await
    }
}

pub async fn list_tasks(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Task>, RecordError> {
    Ok(sqlx::query_as::<_, Task>(
        r#"
        SELECT * FROM tasks
        WHERE ($1::uuid IS NULL OR assignee_id = $1)
          AND ($2::task_priority IS NULL OR priority = $2)
          AND ($3::task_status IS NULL OR status = $3)
        ORDER BY created_at, id
        "#,
    )
    .bind(filter.assignee_id)
    .bind(filter.priority)
    .bind(filter.status)
    .fetch_all(pool)
    .await?)
}

pub async fn get_task(pool: &PgPool, id: Uuid) -> Result<Task, RecordError> {
    sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RecordError::TaskNotFound(id))
}

/// Inserts a task after checking its assignee. Rolled back on any failure.
pub async fn create_task(pool: &PgPool, new: &NewTask) -> Result<Task, RecordError> {
    let mut tx = pool.begin().await?;

    if !user_exists(&mut *tx, new.assignee_id).await? {
        return Err(RecordError::AssigneeNotFound(new.assignee_id));
    }

    let task = sqlx::query_as::<_, Task>(
        r#"
        INSERT INTO tasks (id, title, description, assignee_id, status, priority)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.assignee_id)
    .bind(new.status)
    .bind(new.priority)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!("Created task {} assigned to {}", task.id, task.assignee_id);
    Ok(task)
}

/// Applies a partial update. The task row is locked for the duration so a
/// concurrent delete cannot slip between the existence check and the update.
pub async fn edit_task(pool: &PgPool, id: Uuid, patch: &TaskPatch) -> Result<Task, RecordError> {
    let mut tx = pool.begin().await?;

    let mut task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RecordError::TaskNotFound(id))?;

    if patch.is_empty() {
        return Ok(task);
    }

    if let Some(assignee_id) = patch.assignee_id {
        if !user_exists(&mut *tx, assignee_id).await? {
            return Err(RecordError::AssigneeNotFound(assignee_id));
        }
    }

    patch.apply(&mut task);
    let task = sqlx::query_as::<_, Task>(
        r#"
        UPDATE tasks SET
            title       = $2,
            description = $3,
            assignee_id = $4,
            status      = $5,
            priority    = $6,
            updated_at  = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.assignee_id)
    .bind(task.status)
    .bind(task.priority)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    info!("Updated task {id}");
    Ok(task)
}

pub async fn delete_task(pool: &PgPool, id: Uuid) -> Result<(), RecordError> {
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query("DELETE FROM tasks WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(RecordError::TaskNotFound(id));
    }

    tx.commit().await?;
    info!("Deleted task {id}");
    Ok(())
}

async fn user_exists(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(conn)
        .await
}
