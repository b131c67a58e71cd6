//! The three task tools offered to the model.
//!
//! A tool call arrives as a name plus a JSON argument string. It is decoded
//! into a `TaskAction` with typed arguments before anything touches the
//! record store, so a bad payload never reaches the database.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::errors::RecordError;
use crate::kanban::store::RecordStore;
use crate::llm_client::FunctionCall;
use crate::models::task::{NewTask, TaskPatch, TaskPriority, TaskStatus};

pub const CREATE_TASK: &str = "create_task";
pub const EDIT_TASK: &str = "edit_task";
pub const DELETE_TASK: &str = "delete_task";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Malformed arguments for {tool}: {source}")]
    MalformedArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Record(#[from] RecordError),
}

impl ToolError {
    /// Failures the model can be told about. Storage failures are not.
    pub fn is_reportable(&self) -> bool {
        match self {
            ToolError::MalformedArguments { .. } | ToolError::UnknownTool(_) => true,
            ToolError::Record(e) => e.is_validation(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateTaskArgs {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub assignee_id: Uuid,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EditTaskArgs {
    pub task_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeleteTaskArgs {
    pub task_id: Uuid,
}

/// A decoded tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskAction {
    Create(CreateTaskArgs),
    Edit(EditTaskArgs),
    Delete(DeleteTaskArgs),
}

impl TaskAction {
    pub fn parse(call: &FunctionCall) -> Result<Self, ToolError> {
        let malformed = |source| ToolError::MalformedArguments {
            tool: call.name.clone(),
            source,
        };
        match call.name.as_str() {
            CREATE_TASK => decode(&call.arguments).map(TaskAction::Create).map_err(malformed),
            EDIT_TASK => decode(&call.arguments).map(TaskAction::Edit).map_err(malformed),
            DELETE_TASK => decode(&call.arguments).map(TaskAction::Delete).map_err(malformed),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskAction::Create(_) => CREATE_TASK,
            TaskAction::Edit(_) => EDIT_TASK,
            TaskAction::Delete(_) => DELETE_TASK,
        }
    }

    /// Runs the mutation and returns the success payload for the tool result.
    pub async fn execute(self, records: &dyn RecordStore) -> Result<Value, ToolError> {
        match self {
            TaskAction::Create(args) => {
                let task = records
                    .create_task(NewTask {
                        title: args.title,
                        description: args.description,
                        assignee_id: args.assignee_id,
                        status: args.status,
                        priority: args.priority,
                    })
                    .await?;
                info!("Assistant created task {}", task.id);
                Ok(json!({ "task_id": task.id, "success": true }))
            }
            TaskAction::Edit(args) => {
                let patch = TaskPatch {
                    title: args.title,
                    description: args.description,
                    assignee_id: args.assignee_id,
                    status: args.status,
                    priority: args.priority,
                };
                let task = records.edit_task(args.task_id, patch).await?;
                info!("Assistant edited task {}", task.id);
                Ok(json!({ "task_id": task.id, "success": true }))
            }
            TaskAction::Delete(args) => {
                records.delete_task(args.task_id).await?;
                info!("Assistant deleted task {}", args.task_id);
                Ok(json!({ "success": true }))
            }
        }
    }
}

/// Models occasionally send an empty string for a call with no arguments.
fn decode<T: serde::de::DeserializeOwned>(arguments: &str) -> Result<T, serde_json::Error> {
    let arguments = if arguments.trim().is_empty() {
        "{}"
    } else {
        arguments
    };
    serde_json::from_str(arguments)
}

/// Payload handed back to the model when a reportable tool call fails.
pub fn failure_payload(err: &ToolError) -> Value {
    json!({ "success": false, "error": err.to_string() })
}

/// JSON schemas of the three tools in chat-completions `tools` format.
pub fn tool_schemas() -> Vec<Value> {
    let priority = json!(["low", "medium", "high"]);
    let status = json!(["todo", "in_progress", "review", "done"]);

    vec![
        json!({
            "type": "function",
            "function": {
                "name": CREATE_TASK,
                "description": "Create a new task and assign it to a user",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string", "description": "The title of the task"},
                        "description": {"type": "string", "description": "Detailed description of the task"},
                        "assignee_id": {"type": "string", "description": "UUID of the user to assign the task to"},
                        "priority": {"type": "string", "enum": priority, "description": "Priority of the task"},
                        "status": {"type": "string", "enum": status, "description": "Status of the task"}
                    },
                    "required": ["title", "description", "assignee_id", "priority", "status"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": EDIT_TASK,
                "description": "Edit an existing task",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "task_id": {"type": "string", "description": "UUID of the task to edit"},
                        "title": {"type": "string", "description": "New title of the task (optional)"},
                        "description": {"type": "string", "description": "New description of the task (optional)"},
                        "assignee_id": {"type": "string", "description": "UUID of the new assignee (optional)"},
                        "priority": {"type": "string", "enum": priority, "description": "New priority of the task (optional)"},
                        "status": {"type": "string", "enum": status, "description": "New status of the task (optional)"}
                    },
                    "required": ["task_id"]
                }
            }
        }),
        json!({
            "type": "function",
            "function": {
                "name": DELETE_TASK,
                "description": "Delete an existing task",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "task_id": {"type": "string", "description": "UUID of the task to delete"}
                    },
                    "required": ["task_id"]
                }
            }
        }),
    ]
}
