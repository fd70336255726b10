//! HTTP client for messages-style AI completions.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AiError, Completer, Message, GENERIC_SYSTEM_PROMPT};
use crate::models::AiConfig;

/// Base URL used when the config does not override it.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Protocol version marker sent with every request.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Fixed cap on generated tokens per request.
pub const MAX_OUTPUT_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Clone)]
pub struct AiClient {
    config: AiConfig,
    default_system: Option<String>,
    client: Client,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            default_system: None,
            client: Client::new(),
        }
    }

    /// System prompt used when a request doesn't supply one, typically the
    /// role thesis. Blank prompts are ignored.
    pub fn with_default_system(mut self, system: impl Into<String>) -> Self {
        let system = system.into();
        self.default_system = (!system.trim().is_empty()).then_some(system);
        self
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);
        format!("{}/v1/messages", base.trim_end_matches('/'))
    }

    async fn send(&self, messages: &[Message], system: &str) -> Result<String, AiError> {
        let url = self.endpoint();
        tracing::debug!(
            "AI request to {} ({}, {} messages)",
            url,
            self.config.model,
            messages.len()
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&MessagesRequest {
                model: &self.config.model,
                max_tokens: MAX_OUTPUT_TOKENS,
                system,
                messages,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| {
                    if body.is_empty() {
                        status.to_string()
                    } else {
                        format!("{}: {}", status, body)
                    }
                });
            return Err(AiError::Request(message));
        }

        let payload: MessagesResponse = response.json().await?;
        Ok(payload
            .content
            .into_iter()
            .find_map(|block| block.text)
            .unwrap_or_default())
    }
}

#[async_trait]
impl Completer for AiClient {
    fn is_configured(&self) -> bool {
        self.config.has_key()
    }

    async fn complete(&self, messages: Vec<Message>, system: Option<String>) -> Result<String, AiError> {
        if !self.is_configured() {
            return Err(AiError::Config);
        }

        let system = system
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.default_system.clone())
            .unwrap_or_else(|| GENERIC_SYSTEM_PROMPT.to_string());

        let result = self.send(&messages, &system).await;
        if let Err(ref e) = result {
            tracing::warn!("AI completion failed: {}", e);
        }
        result
    }
}
