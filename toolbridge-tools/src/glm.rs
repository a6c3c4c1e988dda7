//! GLM tool set
//!
//! The API is stateless: sessions keep the full message history and
//! resend it on every turn.

use crate::base::{optional_str, required_str, Result, Tool};
use crate::session::{not_found, SessionService};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use toolbridge_core::session::{HistoryEntry, Session, SessionStore};
use toolbridge_core::utils::short_id;
use toolbridge_providers::{LLMProvider, Message, ProviderResult};
use tracing::{debug, info};

/// Send one completion and return the first choice's text
async fn complete(
    provider: &dyn LLMProvider,
    messages: Vec<Message>,
    model: Option<String>,
) -> ProviderResult<String> {
    let response = provider.chat(messages, model).await?;
    Ok(response.content.unwrap_or_default())
}

/// `chat`: one stateless completion
pub struct GlmChatTool {
    provider: Arc<dyn LLMProvider>,
}

impl GlmChatTool {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for GlmChatTool {
    fn name(&self) -> &str {
        "chat"
    }

    fn description(&self) -> &str {
        "Chat with GLM model (200K context)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "The prompt to send"
                },
                "system": {
                    "type": "string",
                    "description": "Optional system prompt"
                },
                "model": {
                    "type": "string",
                    "description": format!("Model name (default: {})", self.provider.get_default_model())
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let prompt = required_str(&args, "prompt")?;
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = optional_str(&args, "system") {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(prompt));

        Ok(complete(self.provider.as_ref(), messages, optional_str(&args, "model")).await?)
    }
}

/// System prompt for an `analyze_code` task; unknown tasks get a review
pub fn task_prompt(task: &str) -> &'static str {
    match task {
        "explain" => "Explain this code clearly and concisely.",
        "optimize" => "Suggest performance optimizations for this code.",
        "security" => "Analyze this code for security vulnerabilities.",
        "refactor" => "Suggest refactoring improvements for this code.",
        _ => "You are a senior code reviewer. Provide detailed feedback.",
    }
}

/// `analyze_code`: task-specific code analysis
pub struct AnalyzeCodeTool {
    provider: Arc<dyn LLMProvider>,
}

impl AnalyzeCodeTool {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Tool for AnalyzeCodeTool {
    fn name(&self) -> &str {
        "analyze_code"
    }

    fn description(&self) -> &str {
        "Analyze code with GLM's 200K context window."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Code to analyze"
                },
                "task": {
                    "type": "string",
                    "enum": ["review", "explain", "optimize", "security", "refactor"],
                    "description": "Analysis type"
                },
                "language": {
                    "type": "string",
                    "description": "Optional programming language hint"
                }
            },
            "required": ["code", "task"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let code = required_str(&args, "code")?;
        let task = required_str(&args, "task")?;
        let prompt = match optional_str(&args, "language") {
            Some(language) => format!("[{}]\n{}", language, code),
            None => code.to_string(),
        };

        let messages = vec![Message::system(task_prompt(task)), Message::user(prompt)];
        Ok(complete(self.provider.as_ref(), messages, None).await?)
    }
}

fn to_messages(history: &[HistoryEntry]) -> Vec<Message> {
    history
        .iter()
        .map(|entry| Message::new(entry.role.as_str(), entry.content.clone()))
        .collect()
}

/// GLM sessions: full history replay on every turn
pub struct GlmSessions {
    provider: Arc<dyn LLMProvider>,
    store: Mutex<SessionStore>,
}

impl GlmSessions {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            store: Mutex::new(SessionStore::new()),
        }
    }
}

#[async_trait]
impl SessionService for GlmSessions {
    fn store(&self) -> &Mutex<SessionStore> {
        &self.store
    }

    async fn create(
        &self,
        session_id: Option<String>,
        system: Option<String>,
        model: Option<String>,
    ) -> String {
        let id = session_id.unwrap_or_else(short_id);
        let model = model.or_else(|| Some(self.provider.get_default_model()));

        let session = Session::new(&id, model, system);
        if self.store.lock().await.insert(session).is_some() {
            info!("Session {} recreated", id);
        } else {
            info!("Session {} created", id);
        }

        format!("Session created: {}", id)
    }

    async fn chat(&self, session_id: &str, message: &str) -> String {
        let mut store = self.store.lock().await;
        let session = match store.get_mut(session_id) {
            Ok(session) => session,
            Err(_) => {
                return format!(
                    "{} Use session_create to start one.",
                    not_found(session_id)
                )
            }
        };

        let mut messages = to_messages(&session.history);
        messages.push(Message::user(message));
        debug!("Sending {} messages for {}", messages.len(), session_id);

        let response = match complete(self.provider.as_ref(), messages, session.model.clone()).await
        {
            Ok(text) => text,
            Err(e) => format!("Error: {}", e),
        };

        session.record_turn(message, response.clone());

        if response.is_empty() {
            "Error: No response received".to_string()
        } else {
            response
        }
    }
}
