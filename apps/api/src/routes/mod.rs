pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::assistant::handlers as assistant;
use crate::kanban::handlers as kanban;
use crate::resumes::handlers as resumes;
use crate::state::AppState;
use crate::system::handlers as system;
use crate::users::handlers as users;

/// Upper bound on a resume upload request body.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Kanban API
        .route(
            "/v1/tasks",
            post(kanban::handle_create_task).get(kanban::handle_list_tasks),
        )
        .route(
            "/v1/tasks/:id",
            get(kanban::handle_get_task).delete(kanban::handle_delete_task),
        )
        .route("/v1/tasks/:id/status", patch(kanban::handle_update_status))
        .route(
            "/v1/tasks/:id/assignee",
            patch(kanban::handle_update_assignee),
        )
        .route(
            "/v1/tasks/:id/priority",
            patch(kanban::handle_update_priority),
        )
        .route("/v1/tasks/:id/title", patch(kanban::handle_update_title))
        .route(
            "/v1/tasks/:id/description",
            patch(kanban::handle_update_description),
        )
        // Users API
        .route(
            "/v1/users",
            post(users::handle_create_user).get(users::handle_list_users),
        )
        .route(
            "/v1/users/:id",
            get(users::handle_get_user)
                .put(users::handle_update_user)
                .delete(users::handle_delete_user),
        )
        // Resume API
        .route(
            "/v1/resumes",
            post(resumes::handle_upload_resume).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/v1/resumes/:id", get(resumes::handle_download_link))
        .route("/v1/resumes/:id/text", get(resumes::handle_resume_text))
        // Assistant API
        .route("/v1/assistant/chat", post(assistant::handle_chat))
        .route("/v1/assistant/history", get(assistant::handle_history))
        // Operations
        .route("/v1/system/reset", post(system::handle_reset))
        .with_state(state)
}
