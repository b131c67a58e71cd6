// Assistant prompt templates.
// All prompts for the assistant module are defined here.

use std::fmt::Write;

use crate::models::task::Task;
use crate::models::user::User;

pub const ASSISTANT_SYSTEM: &str = "\
You are a helpful task management assistant. Your primary responsibility is to help \
project managers create, edit, and manage tasks.

When a project manager describes a task they want to create, COLLECT all necessary \
information FIRST before creating the task.

You can:
1. Create new tasks using the create_task function
2. Edit existing tasks using the edit_task function
3. Delete tasks using the delete_task function

If the user doesn't specify all required information, ask follow-up questions to collect it.

Be conversational and helpful. If users ask questions about task management in general, \
answer them.

You can also help users find the right assignee for a task by suggesting users from the \
available list. Always refer to users and tasks by the IDs listed below.";

/// The fixed instruction followed by a verbatim listing of the current board.
pub fn build_system_prompt(users: &[User], tasks: &[Task]) -> String {
    let mut prompt = String::with_capacity(ASSISTANT_SYSTEM.len() + 128 * (users.len() + tasks.len()));
    prompt.push_str(ASSISTANT_SYSTEM);

    prompt.push_str("\n\nAVAILABLE USERS:\n");
    if users.is_empty() {
        prompt.push_str("(none)\n");
    }
    for user in users {
        let _ = writeln!(
            prompt,
            "- ID: {}, Name: {}, Email: {}, Role: {}",
            user.id,
            user.name,
            user.email,
            user.role.as_str()
        );
    }

    prompt.push_str("\nEXISTING TASKS:\n");
    if tasks.is_empty() {
        prompt.push_str("(none)\n");
    }
    for task in tasks {
        let _ = writeln!(
            prompt,
            "- ID: {}, Title: {}, Status: {}, Priority: {}, Assignee: {}",
            task.id,
            task.title,
            task.status.as_str(),
            task.priority.as_str(),
            task.assignee_id
        );
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::testing::{sample_task, sample_user};
    use crate::models::task::{TaskPriority, TaskStatus};

    #[test]
    fn test_prompt_lists_users_and_tasks() {
        let user = sample_user("Ada Lovelace", "ada@example.com");
        let mut task = sample_task("Fix login bug", user.id);
        task.status = TaskStatus::InProgress;
        task.priority = TaskPriority::High;

        let prompt = build_system_prompt(std::slice::from_ref(&user), std::slice::from_ref(&task));

        assert!(prompt.starts_with(ASSISTANT_SYSTEM));
        assert!(prompt.contains(&format!(
            "- ID: {}, Name: Ada Lovelace, Email: ada@example.com, Role: backend",
            user.id
        )));
        assert!(prompt.contains(&format!(
            "- ID: {}, Title: Fix login bug, Status: in_progress, Priority: high, Assignee: {}",
            task.id, user.id
        )));
        let users_at = prompt.find("AVAILABLE USERS:").unwrap();
        let tasks_at = prompt.find("EXISTING TASKS:").unwrap();
        assert!(users_at < tasks_at);
    }

    #[test]
    fn test_prompt_marks_empty_board() {
        let prompt = build_system_prompt(&[], &[]);
        assert!(prompt.contains("AVAILABLE USERS:\n(none)\n"));
        assert!(prompt.contains("EXISTING TASKS:\n(none)\n"));
    }
}
