//! Axum route handlers for the assistant chat API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assistant::orchestrator::Orchestrator;
use crate::errors::AppError;
use crate::models::conversation::ConversationMessage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub assistant_response: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub conversation_id: String,
    pub messages: Vec<ConversationMessage>,
}

/// POST /v1/assistant/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if request.user_message.trim().is_empty() {
        return Err(AppError::Validation("user_message must not be empty".into()));
    }
    let conversation_id = conversation_or_default(request.conversation_id, &state);
    info!("Assistant turn in conversation {conversation_id}");

    let settings = &state.config.assistant;
    let reply = Orchestrator::new(
        state.records.as_ref(),
        state.conversations.as_ref(),
        state.llm.as_ref(),
        settings,
    )
    .handle_user_message(&conversation_id, &request.user_message)
    .await?;

    Ok(Json(ChatResponse {
        assistant_response: reply,
    }))
}

/// GET /v1/assistant/history
///
/// The full log, not the window the model sees.
pub async fn handle_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let conversation_id = conversation_or_default(query.conversation_id, &state);
    let messages = state
        .conversations
        .history(&conversation_id, None)
        .await?;
    Ok(Json(HistoryResponse {
        conversation_id,
        messages,
    }))
}

fn conversation_or_default(requested: Option<String>, state: &AppState) -> String {
    requested
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| state.config.assistant.default_conversation.clone())
}
