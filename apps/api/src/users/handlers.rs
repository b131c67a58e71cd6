//! Axum route handlers for the Users API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{NewUser, User, UserUpdate};
use crate::resumes::storage::purge_resume;
use crate::state::AppState;
use crate::users::store::{create_user, delete_user, get_user, list_users, update_user};

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
}

/// POST /v1/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(request): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    require_name(&request.name)?;
    require_email(&request.email)?;
    let user = create_user(&state.db, &request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /v1/users
pub async fn handle_list_users(
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, AppError> {
    let users = list_users(&state.db).await?;
    Ok(Json(UserListResponse { users }))
}

/// GET /v1/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    Ok(Json(get_user(&state.db, id).await?))
}

/// PUT /v1/users/:id
///
/// Partial update. Pointing the user at a new resume purges the old one.
pub async fn handle_update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UserUpdate>,
) -> Result<Json<User>, AppError> {
    if let Some(name) = &request.name {
        require_name(name)?;
    }
    if let Some(email) = &request.email {
        require_email(email)?;
    }

    let (user, replaced) = update_user(&state.db, id, &request).await?;
    if let Some(upload) = replaced {
        purge_resume(&state, &upload).await;
    }
    Ok(Json(user))
}

/// DELETE /v1/users/:id
pub async fn handle_delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if let Some(upload) = delete_user(&state.db, id).await? {
        purge_resume(&state, &upload).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

fn require_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    Ok(())
}

fn require_email(email: &str) -> Result<(), AppError> {
    if !is_plausible_email(email) {
        return Err(AppError::Validation(format!("'{email}' is not a valid email")));
    }
    Ok(())
}

/// One `@`, a non-empty local part, and a dotted domain. Deliverability is
/// not our problem.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}
