use crate::error::RelayError;
use crate::provider::ChatModel;
use crate::state::ChatMessage;
use anyhow::Result;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

/// Client for an OpenAI-compatible chat-completion endpoint
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Send one chat-completion request. Exactly one HTTP call is made; there
    /// are no retries.
    pub async fn chat(
        &self,
        api_key: &str,
        model: ChatModel,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, RelayError> {
        let request = OpenAIRequest {
            model: model.as_str(),
            messages,
            max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, timeout = e.is_timeout(), "Chat-completion request failed");
                RelayError::ProviderUnreachable
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!(error = %e, "Failed to read chat-completion response");
            RelayError::ProviderUnreachable
        })?;
        // Read the two fields independently so a malformed `choices` never
        // hides the provider's own error message.
        let parsed: Value = serde_json::from_str(&body).unwrap_or_else(|e| {
            debug!(error = %e, status = %status, "Chat-completion response is not JSON");
            Value::Null
        });

        let content = parsed
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str);

        match content {
            Some(content) if status.is_success() => Ok(content.to_string()),
            _ => {
                debug!(status = %status, "Chat-completion provider returned an error");
                let message = parsed
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                Err(RelayError::provider(message))
            }
        }
    }
}
