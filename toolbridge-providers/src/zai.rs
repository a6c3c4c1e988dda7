//! Z.ai GLM HTTP client (OpenAI-compatible chat completions)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::base::{LLMProvider, LLMResponse, Message, ProviderError, ProviderResult};

pub const DEFAULT_API_BASE: &str = "https://api.z.ai/api/paas/v4";
pub const DEFAULT_MODEL: &str = "glm-4.7";

/// Chat completions request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
}

/// Chat completions response body
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: i64,
    #[serde(default)]
    completion_tokens: i64,
    #[serde(default)]
    total_tokens: i64,
}

/// Z.ai provider client
pub struct ZaiClient {
    client: Client,
    api_base: String,
    api_key: String,
    default_model: String,
}

impl ZaiClient {
    /// Create a new Z.ai client
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        let api_base = api_base
            .map(|base| base.trim().trim_end_matches('/').to_string())
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Self {
            client: Client::builder()
                .timeout(request_timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_base,
            api_key: api_key.into(),
            default_model: default_model.into(),
        }
    }

    fn parse_response(&self, response: ChatCompletionResponse) -> ProviderResult<LLMResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?;

        let usage = &response.usage;
        debug!(
            "Completion finished ({}): {} prompt + {} completion = {} tokens",
            choice.finish_reason.as_deref().unwrap_or("stop"),
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total_tokens
        );

        Ok(LLMResponse {
            content: choice.message.content,
        })
    }
}

#[async_trait]
impl LLMProvider for ZaiClient {
    async fn chat(
        &self,
        messages: Vec<Message>,
        model: Option<String>,
    ) -> ProviderResult<LLMResponse> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::ConfigError(
                "Z.ai API key is not set (Z_AI_API_KEY)".to_string(),
            ));
        }

        let model = model.unwrap_or_else(|| self.default_model.clone());
        let request = ChatCompletionRequest {
            model: model.clone(),
            messages,
        };

        debug!(
            "Sending chat request to {} with model {} ({} messages)",
            self.api_base,
            model,
            request.messages.len()
        );

        let url = format!("{}/chat/completions", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let response_data: ChatCompletionResponse = response.json().await?;
        self.parse_response(response_data)
    }

    fn get_default_model(&self) -> String {
        self.default_model.clone()
    }
}
