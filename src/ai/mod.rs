//! AI completion contract shared by ghost text, seeds and transforms.
//!
//! Callers depend on the [`Completer`] trait; [`AiClient`] is the HTTP
//! implementation talking to a messages-style completion endpoint.

mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::{AiClient, ANTHROPIC_VERSION, DEFAULT_BASE_URL, MAX_OUTPUT_TOKENS};

/// System prompt used when neither the caller nor the role definition supplies one.
pub const GENERIC_SYSTEM_PROMPT: &str = "You are a helpful writing assistant.";

/// AI operation failures.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI is not configured: add an API key in settings")]
    Config,

    #[error("AI request failed: {0}")]
    Request(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single request/response text completion.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Whether a credential is present. Nothing is requested when false.
    fn is_configured(&self) -> bool;

    /// Complete `messages`, falling back to the default system prompt when
    /// `system` is `None`.
    async fn complete(&self, messages: Vec<Message>, system: Option<String>) -> Result<String, AiError>;
}
