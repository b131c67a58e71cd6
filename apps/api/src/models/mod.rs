pub mod conversation;
pub mod resume;
pub mod task;
pub mod user;
