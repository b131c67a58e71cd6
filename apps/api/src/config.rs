use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

/// Upper bound on `OPENAI_MAX_ATTEMPTS`; larger values are clamped.
pub const MAX_LLM_ATTEMPTS: u32 = 10;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_max_attempts: u32,
    pub port: u16,
    pub rust_log: String,
    pub assistant: AssistantSettings,
    pub enable_system_reset: bool,
}

/// Knobs for the assistant tool-call loop.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    /// Most recent messages replayed to the model each turn. `None` replays everything.
    pub history_window: Option<usize>,
    pub tool_errors: ToolErrorPolicy,
    /// Conversation used when a caller does not name one.
    pub default_conversation: String,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            history_window: Some(50),
            tool_errors: ToolErrorPolicy::Abort,
            default_conversation: "default".to_string(),
        }
    }
}

/// What the orchestrator does when a tool call fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolErrorPolicy {
    /// Propagate the error and fail the whole turn.
    Abort,
    /// Hand the failure back to the model as a `success: false` tool result.
    Report,
}

impl FromStr for ToolErrorPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(ToolErrorPolicy::Abort),
            "report" => Ok(ToolErrorPolicy::Report),
            other => Err(anyhow!("unknown tool error policy '{other}' (expected abort|report)")),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let history_window: usize = optional_env("ASSISTANT_HISTORY_WINDOW", "50")
            .parse()
            .context("ASSISTANT_HISTORY_WINDOW must be a non-negative integer")?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_model: optional_env("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: optional_env("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            openai_max_attempts: attempts_from(
                optional_env("OPENAI_MAX_ATTEMPTS", "1")
                    .parse::<u32>()
                    .context("OPENAI_MAX_ATTEMPTS must be a positive integer")?,
            ),
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
            assistant: AssistantSettings {
                history_window: window_from(history_window),
                tool_errors: optional_env("ASSISTANT_TOOL_ERRORS", "abort").parse()?,
                default_conversation: optional_env("ASSISTANT_DEFAULT_CONVERSATION", "default"),
            },
            enable_system_reset: parse_flag(&optional_env("ENABLE_SYSTEM_RESET", "false"))
                .context("ENABLE_SYSTEM_RESET must be true or false")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// 0 means "no window".
fn window_from(n: usize) -> Option<usize> {
    (n > 0).then_some(n)
}

fn attempts_from(n: u32) -> u32 {
    n.clamp(1, MAX_LLM_ATTEMPTS)
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow!("invalid boolean '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error_policy_parses_case_insensitively() {
        assert_eq!("Report".parse::<ToolErrorPolicy>().unwrap(), ToolErrorPolicy::Report);
        assert_eq!(" abort ".parse::<ToolErrorPolicy>().unwrap(), ToolErrorPolicy::Abort);
        assert!("retry".parse::<ToolErrorPolicy>().is_err());
    }

    #[test]
    fn test_zero_history_window_is_unbounded() {
        assert_eq!(window_from(0), None);
        assert_eq!(window_from(12), Some(12));
    }

    #[test]
    fn test_llm_attempts_are_clamped() {
        assert_eq!(attempts_from(0), 1);
        assert_eq!(attempts_from(3), 3);
        assert_eq!(attempts_from(u32::MAX), MAX_LLM_ATTEMPTS);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
