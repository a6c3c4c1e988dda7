//! Base trait and error type for model backends

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command timed out after {secs} seconds")]
    Timeout { secs: u64 },

    /// Non-zero exit; carries stderr, or stdout when stderr is empty
    #[error("{0}")]
    CommandFailed(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Response from a chat-completions backend
#[derive(Debug, Clone, PartialEq)]
pub struct LLMResponse {
    pub content: Option<String>,
}

/// A message in the chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    /// Create a message with an arbitrary role
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Trait for role-tagged message backends
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send a chat completion request
    async fn chat(&self, messages: Vec<Message>, model: Option<String>)
        -> ProviderResult<LLMResponse>;

    /// Get the default model for this provider
    fn get_default_model(&self) -> String;
}
