// Chat assistant: turns natural-language requests into task mutations via
// model tool calls, and keeps a per-conversation message log.

pub mod conversation;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod tools;

#[cfg(test)]
pub mod testing;

pub use orchestrator::AssistantError;
