//! Completion-service boundary.
//!
//! One trait, two implementations: an OpenAI-compatible HTTP client for
//! production and a scripted client for tests and offline demos. Model
//! routing is by id only; the narrative model sits behind the same
//! OpenAI-compatible surface, so a single transport serves both.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod openai;
pub mod scripted;

pub use openai::{OpenAiClient, OpenAiConfig};
pub use scripted::ScriptedClient;

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One completion call: ordered messages, model id, sampling temperature.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub finish_reason: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("completion API key missing: set OPENAI_API_KEY")]
    MissingApiKey,
    #[error("network error: {0}")]
    Network(String),
    #[error("completion API error: {0}")]
    Api(String),
    #[error("invalid completion reply: {0}")]
    InvalidResponse(String),
}

// ============================================================================
// Client interface
// ============================================================================

/// Sends role-tagged messages to a completion endpoint and returns the
/// generated text. Implementations must be shareable across invocations.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_value(Role::System).unwrap(), "system");
        assert_eq!(serde_json::to_value(Role::User).unwrap(), "user");
        assert_eq!(serde_json::to_value(Role::Assistant).unwrap(), "assistant");
    }

    #[test]
    fn message_constructors_tag_the_role() {
        assert_eq!(ChatMessage::system("a").role, Role::System);
        assert_eq!(ChatMessage::user("b").role, Role::User);
        assert_eq!(ChatMessage::assistant("c").role, Role::Assistant);
    }
}
