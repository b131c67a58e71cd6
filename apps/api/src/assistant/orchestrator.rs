//! One assistant turn: a user utterance in, zero or more task mutations and
//! one natural-language reply out.
//!
//! Flow: board snapshot → system prompt → history window → persist user
//!       message → completion (auto tool choice) → dispatch tool calls →
//!       second completion → persist reply.
//!
//! The user message is written before the model is called, so a failed turn
//! still leaves it in the log. Tool calls commit one by one; a failure on a
//! later call does not undo earlier ones.

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::assistant::conversation::ConversationLog;
use crate::assistant::prompts::build_system_prompt;
use crate::assistant::tools::{failure_payload, tool_schemas, TaskAction, ToolError};
use crate::config::{AssistantSettings, ToolErrorPolicy};
use crate::errors::RecordError;
use crate::kanban::store::RecordStore;
use crate::llm_client::{ChatMessage, ChatModel, Completion, LlmError, ToolCallRequest};
use crate::models::conversation::ConversationMessage;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Model error: {0}")]
    Model(#[from] LlmError),
}

impl From<RecordError> for AssistantError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Database(e) => AssistantError::Storage(e),
            other => AssistantError::Tool(ToolError::Record(other)),
        }
    }
}

/// Runs assistant turns against borrowed collaborators. Cheap to build per
/// request.
pub struct Orchestrator<'a> {
    records: &'a dyn RecordStore,
    conversations: &'a dyn ConversationLog,
    model: &'a dyn ChatModel,
    settings: &'a AssistantSettings,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        records: &'a dyn RecordStore,
        conversations: &'a dyn ConversationLog,
        model: &'a dyn ChatModel,
        settings: &'a AssistantSettings,
    ) -> Self {
        Self {
            records,
            conversations,
            model,
            settings,
        }
    }

    pub async fn handle_user_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<String, AssistantError> {
        let users = self.records.users().await?;
        let tasks = self.records.tasks().await?;
        let system_prompt = build_system_prompt(&users, &tasks);

        let history = self
            .conversations
            .history(conversation_id, self.settings.history_window)
            .await?;

        let mut messages = Vec::with_capacity(history.len() + 4);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(history.iter().map(ChatMessage::from));

        self.conversations
            .append(conversation_id, &ConversationMessage::user(text))
            .await?;
        messages.push(ChatMessage::user(text));

        let schemas = tool_schemas();
        let first = self.model.complete(&messages, Some(&schemas)).await?;

        let reply = if first.tool_calls().is_empty() {
            reply_text(first)?
        } else {
            let calls = first.tool_calls().to_vec();
            info!(
                "Model requested {} tool call(s) in conversation {conversation_id}",
                calls.len()
            );
            messages.push(first.message);

            for call in &calls {
                let payload = self.run_tool(call).await?;
                messages.push(ChatMessage::tool_result(call, payload.to_string()));
            }

            let second = self.model.complete(&messages, None).await?;
            reply_text(second)?
        };

        self.conversations
            .append(conversation_id, &ConversationMessage::assistant(reply.as_str()))
            .await?;

        Ok(reply)
    }

    /// Decodes and executes one tool call, applying the tool error policy.
    async fn run_tool(&self, call: &ToolCallRequest) -> Result<Value, AssistantError> {
        let outcome = match TaskAction::parse(&call.function) {
            Ok(action) => {
                info!("Dispatching {} ({})", action.name(), call.id);
                action.execute(self.records).await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(payload) => Ok(payload),
            Err(e) if self.settings.tool_errors == ToolErrorPolicy::Report && e.is_reportable() => {
                warn!(
                    "Tool call {} failed, reporting back to the model: {e}",
                    call.function.name
                );
                Ok(failure_payload(&e))
            }
            Err(ToolError::Record(e)) => Err(e.into()),
            Err(e) => Err(e.into()),
        }
    }
}

fn reply_text(completion: Completion) -> Result<String, AssistantError> {
    completion
        .text()
        .map(str::to_string)
        .ok_or(AssistantError::Model(LlmError::EmptyContent))
}
