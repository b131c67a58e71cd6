//! Axum route handlers for the Kanban (task) API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::kanban::store::{create_task, delete_task, edit_task, get_task, list_tasks, TaskFilter};
use crate::models::task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub task: NewTask,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAssigneeRequest {
    pub assignee_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePriorityRequest {
    pub priority: TaskPriority,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTitleRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDescriptionRequest {
    pub description: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /v1/tasks
pub async fn handle_create_task(
    State(state): State<AppState>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), AppError> {
    require_title(&request.task.title)?;
    let task = create_task(&state.db, &request.task).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse { task })))
}

/// GET /v1/tasks
pub async fn handle_list_tasks(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<TaskListResponse>, AppError> {
    let tasks = list_tasks(&state.db, &filter).await?;
    Ok(Json(TaskListResponse { tasks }))
}

/// GET /v1/tasks/:id
pub async fn handle_get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TaskResponse>, AppError> {
    let task = get_task(&state.db, id).await?;
    Ok(Json(TaskResponse { task }))
}

/// PATCH /v1/tasks/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Task>, AppError> {
    let patch = TaskPatch {
        status: Some(request.status),
        ..Default::default()
    };
    Ok(Json(edit_task(&state.db, id, &patch).await?))
}

/// PATCH /v1/tasks/:id/assignee
pub async fn handle_update_assignee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAssigneeRequest>,
) -> Result<Json<Task>, AppError> {
    let patch = TaskPatch {
        assignee_id: Some(request.assignee_id),
        ..Default::default()
    };
    Ok(Json(edit_task(&state.db, id, &patch).await?))
}

/// PATCH /v1/tasks/:id/priority
pub async fn handle_update_priority(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePriorityRequest>,
) -> Result<Json<Task>, AppError> {
    let patch = TaskPatch {
        priority: Some(request.priority),
        ..Default::default()
    };
    Ok(Json(edit_task(&state.db, id, &patch).await?))
}

/// PATCH /v1/tasks/:id/title
pub async fn handle_update_title(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTitleRequest>,
) -> Result<Json<Task>, AppError> {
    require_title(&request.title)?;
    let patch = TaskPatch {
        title: Some(request.title),
        ..Default::default()
    };
    Ok(Json(edit_task(&state.db, id, &patch).await?))
}

/// PATCH /v1/tasks/:id/description
pub async fn handle_update_description(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDescriptionRequest>,
) -> Result<Json<Task>, AppError> {
    let patch = TaskPatch {
        description: Some(request.description),
        ..Default::default()
    };
    Ok(Json(edit_task(&state.db, id, &patch).await?))
}

/// DELETE /v1/tasks/:id
pub async fn handle_delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_task(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn require_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    Ok(())
}
