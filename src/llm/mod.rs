//! Chat model abstraction.
//!
//! [`CloudChatModel`] speaks the OpenAI chat completions wire format;
//! [`MockChatModel`] is an in-process stand-in selected by configuring the
//! API key as `"mock"`.

use crate::config::LlmConfig;
use crate::errors::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant", content: content.into() }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion over the message transcript.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError>;
}

pub struct CloudChatModel {
    client: reqwest::Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

impl CloudChatModel {
    pub fn new(config: LlmConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::LlmCall(format!("HTTP client setup: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChatModel for CloudChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.config.api_url);
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
            // Grounded answering wants low creativity.
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::LlmCall(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::LlmCall(format!("API error {status}: {body}")));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::LlmCall(format!("response parse: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::LlmCall("empty completion".to_string()))
    }
}

/// Canned-response model for local runs without an LLM backend.
#[derive(Default)]
pub struct MockChatModel;

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AppError> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or("");
        let preview: String = last_user.chars().take(60).collect();
        Ok(format!("Mock completion for: {preview}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_echoes_last_user_message() {
        let model = MockChatModel;
        let reply = model
            .complete(&[
                ChatMessage::system("be terse"),
                ChatMessage::user("Is maternity covered?"),
            ])
            .await
            .unwrap();
        assert!(reply.contains("Is maternity covered?"));
    }
}
