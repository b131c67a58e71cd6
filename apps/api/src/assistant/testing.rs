//! In-memory stand-ins for the record store, conversation log and chat model,
//! plus helpers for tests that run against a real database.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::assistant::conversation::ConversationLog;
use crate::db::MIGRATOR;
use crate::errors::RecordError;
use crate::kanban::store::RecordStore;
use crate::llm_client::{ChatMessage, ChatModel, Completion, LlmError, ToolCallRequest};
use crate::models::conversation::{ConversationMessage, MessageRole};
use crate::models::task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
use crate::models::user::{NewUser, User, UserRole};
use crate::resumes::store::insert_upload;
use crate::users::store::create_user;

pub fn sample_user(name: &str, email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        notes: None,
        role: UserRole::Backend,
        resume_id: Uuid::new_v4(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn sample_task(title: &str, assignee_id: Uuid) -> Task {
    Task {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: None,
        assignee_id,
        status: TaskStatus::Todo,
        priority: TaskPriority::Medium,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Pool on `DATABASE_URL` with the schema applied, or `None` (test skipped)
/// when no database is configured.
pub async fn database() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    Some(pool)
}

/// Inserts a user (and the resume upload it must reference) with a unique email.
pub async fn seed_user(pool: &PgPool, name: &str) -> User {
    let resume_id = Uuid::new_v4();
    insert_upload(
        pool,
        resume_id,
        &format!("resumes/{resume_id}/cv.pdf"),
        &format!("resume_text:{resume_id}"),
        "cv.pdf",
    )
    .await
    .unwrap();
    create_user(
        pool,
        &NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            notes: None,
            role: UserRole::Backend,
            resume_id,
        },
    )
    .await
    .unwrap()
}

/// Record store over two vectors. Each mutation validates before touching
/// state, which is what a rolled-back transaction looks like from outside.
#[derive(Default)]
pub struct InMemoryRecords {
    users: Mutex<Vec<User>>,
    tasks: Mutex<Vec<Task>>,
    /// When set, every call fails the way a dropped database connection would.
    pub fail_storage: bool,
    /// When set, reads succeed but every mutation fails at the database.
    pub fail_writes: bool,
}

impl InMemoryRecords {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Default::default()
        }
    }

    pub fn insert_task(&self, title: &str, assignee_id: Uuid) -> Task {
        let task = sample_task(title, assignee_id);
        self.tasks.lock().unwrap().push(task.clone());
        task
    }

    pub fn task_snapshot(&self) -> Vec<Task> {
        self.tasks.lock().unwrap().clone()
    }

    fn check_storage(&self) -> Result<(), RecordError> {
        if self.fail_storage {
            return Err(RecordError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), RecordError> {
        self.check_storage()?;
        if self.fail_writes {
            return Err(RecordError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn user_exists(&self, id: Uuid) -> bool {
        self.users.lock().unwrap().iter().any(|u| u.id == id)
    }
}

#[async_trait]
impl RecordStore for InMemoryRecords {
    async fn users(&self) -> Result<Vec<User>, RecordError> {
        self.check_storage()?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn tasks(&self) -> Result<Vec<Task>, RecordError> {
        self.check_storage()?;
        Ok(self.task_snapshot())
    }

    async fn create_task(&self, new: NewTask) -> Result<Task, RecordError> {
        self.check_writes()?;
        if !self.user_exists(new.assignee_id) {
            return Err(RecordError::AssigneeNotFound(new.assignee_id));
        }
        let mut task = sample_task(&new.title, new.assignee_id);
        task.description = new.description;
        task.status = new.status;
        task.priority = new.priority;
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn edit_task(&self, id: Uuid, patch: TaskPatch) -> Result<Task, RecordError> {
        self.check_writes()?;
        if let Some(assignee_id) = patch.assignee_id {
            if !self.user_exists(assignee_id) {
                // Existence of the task is checked first, as in the SQL store.
                if !self.tasks.lock().unwrap().iter().any(|t| t.id == id) {
                    return Err(RecordError::TaskNotFound(id));
                }
                return Err(RecordError::AssigneeNotFound(assignee_id));
            }
        }
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(RecordError::TaskNotFound(id))?;
        patch.apply(task);
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), RecordError> {
        self.check_writes()?;
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(RecordError::TaskNotFound(id));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryConversationLog {
    conversations: Mutex<HashMap<String, Vec<ConversationMessage>>>,
}

impl InMemoryConversationLog {
    pub fn messages(&self, conversation_id: &str) -> Vec<ConversationMessage> {
        self.conversations
            .lock()
            .unwrap()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConversationLog for InMemoryConversationLog {
    async fn append(
        &self,
        conversation_id: &str,
        message: &ConversationMessage,
    ) -> Result<(), sqlx::Error> {
        // Give concurrent turns a chance to interleave.
        tokio::task::yield_now().await;
        self.conversations
            .lock()
            .unwrap()
            .entry(conversation_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn history(
        &self,
        conversation_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ConversationMessage>, sqlx::Error> {
        let all = self.messages(conversation_id);
        let skip = limit.map_or(0, |n| all.len().saturating_sub(n));
        Ok(all.into_iter().skip(skip).collect())
    }
}

/// One request the scripted model received.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub messages: Vec<ChatMessage>,
    pub offered_tools: usize,
}

/// Replays canned completions in order and records every request.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<Completion, LlmError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_text(self, text: &str) -> Self {
        self.push(Ok(Completion {
            message: ChatMessage {
                role: MessageRole::Assistant,
                content: Some(text.to_string()),
                tool_calls: Vec::new(),
                tool_call_id: None,
                name: None,
            },
        }))
    }

    pub fn reply_tool_calls(self, calls: Vec<ToolCallRequest>) -> Self {
        self.push(Ok(Completion {
            message: ChatMessage {
                role: MessageRole::Assistant,
                content: None,
                tool_calls: calls,
                tool_call_id: None,
                name: None,
            },
        }))
    }

    pub fn fail(self, status: u16, message: &str) -> Self {
        self.push(Err(LlmError::Api {
            status,
            message: message.to_string(),
        }))
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn push(self, reply: Result<Completion, LlmError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Value]>,
    ) -> Result<Completion, LlmError> {
        self.requests.lock().unwrap().push(ModelRequest {
            messages: messages.to_vec(),
            offered_tools: tools.map_or(0, <[Value]>::len),
        });
        tokio::task::yield_now().await;
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}
