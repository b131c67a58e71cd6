// Kanban board: task persistence and the task CRUD API.
// The assistant reaches tasks only through `store::RecordStore`.

pub mod handlers;
pub mod store;
