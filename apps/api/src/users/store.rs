use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::RecordError;
use crate::models::resume::ResumeUpload;
use crate::models::user::{NewUser, User, UserUpdate};

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, RecordError> {
    Ok(
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at, id")
            .fetch_all(pool)
            .await?,
    )
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<User, RecordError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(RecordError::UserNotFound(id))
}

pub async fn create_user(pool: &PgPool, new: &NewUser) -> Result<User, RecordError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, notes, role, resume_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.notes)
    .bind(new.role)
    .bind(new.resume_id)
    .fetch_one(pool)
    .await
    .map_err(|e| classify_write_error(e, new.resume_id))?;

    info!("Created user {} ({})", user.id, user.email);
    Ok(user)
}

/// Applies a partial update.
///
/// When the update points the user at a different resume, the previous
/// upload row is removed in the same transaction and returned so the caller
/// can purge its object and document.
pub async fn update_user(
    pool: &PgPool,
    id: Uuid,
    update: &UserUpdate,
) -> Result<(User, Option<ResumeUpload>), RecordError> {
    let mut tx = pool.begin().await?;

    let current_resume: Uuid =
        sqlx::query_scalar("SELECT resume_id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RecordError::UserNotFound(id))?;

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            name       = COALESCE($2, name),
            email      = COALESCE($3, email),
            notes      = COALESCE($4, notes),
            role       = COALESCE($5, role),
            resume_id  = COALESCE($6, resume_id),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&update.name)
    .bind(&update.email)
    .bind(&update.notes)
    .bind(update.role)
    .bind(update.resume_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| classify_write_error(e, update.resume_id.unwrap_or(current_resume)))?;

    let replaced = if user.resume_id != current_resume {
        remove_resume_upload(&mut tx, current_resume).await?
    } else {
        None
    };

    tx.commit().await?;
    info!("Updated user {id}");
    Ok((user, replaced))
}

/// Deletes a user and its resume upload row, returning the upload so the
/// caller can purge the object and document stores.
pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<Option<ResumeUpload>, RecordError> {
    let mut tx = pool.begin().await?;

    let resume_id: Uuid = sqlx::query_scalar("DELETE FROM users WHERE id = $1 RETURNING resume_id")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RecordError::UserHasTasks(id)
            }
            other => RecordError::Database(other),
        })?
        .ok_or(RecordError::UserNotFound(id))?;

    let upload = remove_resume_upload(&mut tx, resume_id).await?;

    tx.commit().await?;
    info!("Deleted user {id}");
    Ok(upload)
}

/// Drops an upload row unless another user still points at it.
async fn remove_resume_upload(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    resume_id: Uuid,
) -> Result<Option<ResumeUpload>, RecordError> {
    Ok(sqlx::query_as::<_, ResumeUpload>(
        r#"
        DELETE FROM resume_uploads
        WHERE id = $1
          AND NOT EXISTS (SELECT 1 FROM users WHERE resume_id = $1)
        RETURNING *
        "#,
    )
    .bind(resume_id)
    .fetch_optional(&mut **tx)
    .await?)
}

fn classify_write_error(err: sqlx::Error, resume_id: Uuid) -> RecordError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return RecordError::EmailTaken;
        }
        if db.is_foreign_key_violation() {
            return RecordError::ResumeNotFound(resume_id);
        }
    }
    RecordError::Database(err)
}
