//! Scripted completion client for tests and offline demos.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{CompletionClient, CompletionRequest, CompletionResponse, LlmError};

/// Replays a fixed sequence of replies and records every request it saw.
///
/// Popping past the end of the script returns an API-style error so a
/// mis-scripted test fails loudly instead of feeding empty content
/// downstream.
#[derive(Default)]
pub struct ScriptedClient {
    /// Stored reversed so `pop()` yields scripted order.
    replies: Mutex<Vec<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut replies: Vec<String> = replies.into_iter().map(Into::into).collect();
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);
        let reply = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop();
        match reply {
            Some(content) => Ok(CompletionResponse {
                content,
                finish_reason: Some("stop".to_string()),
            }),
            None => Err(LlmError::Api("scripted replies exhausted".to_string())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
