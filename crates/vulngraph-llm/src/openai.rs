//! OpenAI-compatible chat-completions client.
//!
//! Works against api.openai.com and against any proxy exposing the same
//! surface (which is how the narrative model is reached).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::{CompletionClient, CompletionRequest, CompletionResponse, LlmError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const API_KEY_ENV: &str = "OPENAI_API_KEY";
const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    /// Key from `OPENAI_API_KEY` (required), base URL from
    /// `OPENAI_BASE_URL` (optional).
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| LlmError::MissingApiKey)?;
        let base_url =
            std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            api_key,
            base_url,
            timeout_secs: 60,
        })
    }
}

pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(OpenAiConfig::from_env()?)
    }
}

fn request_body(request: &CompletionRequest) -> serde_json::Value {
    let messages: Vec<serde_json::Value> = request
        .messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        })
        .collect();

    serde_json::json!({
        "model": request.model,
        "messages": messages,
        "temperature": request.temperature,
    })
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body(&request))
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{status}: {body}")));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = data["choices"]
            .get(0)
            .ok_or_else(|| LlmError::InvalidResponse("reply carried no choices".to_string()))?;
        let content = choice["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let finish_reason = choice["finish_reason"].as_str().map(String::from);

        Ok(CompletionResponse {
            content,
            finish_reason,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChatMessage;

    #[test]
    fn body_carries_model_messages_and_temperature() {
        let request = CompletionRequest {
            model: "gpt-4.1".to_string(),
            messages: vec![
                ChatMessage::system("You classify questions."),
                ChatMessage::user("list critical findings"),
            ],
            temperature: 0.0,
        };
        let body = request_body(&request);
        assert_eq!(body["model"], "gpt-4.1");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "list critical findings");
    }

    #[test]
    fn config_from_env_does_not_panic() {
        // May be Ok or Err depending on the environment; either is fine.
        let _ = OpenAiConfig::from_env();
    }
}
