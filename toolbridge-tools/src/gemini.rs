//! Gemini tool set
//!
//! Stateless tools call the CLI once per request. Sessions prefer the
//! CLI's own `--resume` handle and fall back to replaying the transcript.

use crate::base::{optional_bool, optional_str, optional_u64, required_str, Result, Tool};
use crate::session::{not_found, SessionService};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use toolbridge_core::session::{HistoryEntry, Role, Session, SessionStore};
use toolbridge_core::utils::short_id;
use toolbridge_providers::GeminiCli;
use tracing::{debug, info, warn};

const DEFAULT_ANALYSIS_PROMPT: &str = "Analyze this file and provide a detailed description.";
const PRIMING_PROMPT: &str = "Session initialized. Acknowledge briefly.";
const NO_RESPONSE: &str = "Error: No response received";

/// `chat`: one stateless prompt
pub struct GeminiChatTool {
    cli: Arc<GeminiCli>,
    default_yolo: bool,
}

impl GeminiChatTool {
    pub fn new(cli: Arc<GeminiCli>, default_yolo: bool) -> Self {
        Self { cli, default_yolo }
    }
}

#[async_trait]
impl Tool for GeminiChatTool {
    fn name(&self) -> &str {
        "chat"
    }

    fn description(&self) -> &str {
        "Chat with Gemini (stateless single call)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "The prompt to send"
                },
                "model": {
                    "type": "string",
                    "description": "Optional model name override"
                },
                "system": {
                    "type": "string",
                    "description": "Optional system prompt (prepended to prompt)"
                },
                "yolo": {
                    "type": "boolean",
                    "description": "Auto-accept all actions (default: true)"
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let prompt = required_str(&args, "prompt")?;
        let model = optional_str(&args, "model");
        let yolo = optional_bool(&args, "yolo").unwrap_or(self.default_yolo);

        let full_prompt = match optional_str(&args, "system") {
            Some(system) => format!("{}\n\n{}", system, prompt),
            None => prompt.to_string(),
        };

        Ok(self.cli.ask(&full_prompt, model.as_deref(), yolo).await?)
    }
}

/// `googleSearch`: web search through Gemini's search grounding
pub struct GoogleSearchTool {
    cli: Arc<GeminiCli>,
}

impl GoogleSearchTool {
    pub fn new(cli: Arc<GeminiCli>) -> Self {
        Self { cli }
    }
}

/// Build the search prompt sent on stdin
pub fn search_prompt(query: &str, limit: Option<u64>, raw: bool) -> String {
    let mut prompt = format!("Search: {}", query);
    if let Some(limit) = limit.filter(|n| *n > 0) {
        prompt.push_str(&format!(" (limit to {} results)", limit));
    }
    if raw {
        prompt.push_str("\nReturn the raw results: the URL and snippet of each result, without a summary.");
    }
    prompt
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn name(&self) -> &str {
        "googleSearch"
    }

    fn description(&self) -> &str {
        "Search the web via Gemini's Google Search grounding."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                },
                "model": {
                    "type": "string",
                    "description": "Optional model name override"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results (optional)"
                },
                "raw": {
                    "type": "boolean",
                    "description": "Return raw results with URLs and snippets (optional)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let query = required_str(&args, "query")?;
        let prompt = search_prompt(
            query,
            optional_u64(&args, "limit"),
            optional_bool(&args, "raw").unwrap_or(false),
        );
        let model = optional_str(&args, "model");
        Ok(self.cli.ask(&prompt, model.as_deref(), true).await?)
    }
}

/// `analyzeFile`: describe an image, PDF or text file
pub struct AnalyzeFileTool {
    cli: Arc<GeminiCli>,
}

impl AnalyzeFileTool {
    pub fn new(cli: Arc<GeminiCli>) -> Self {
        Self { cli }
    }
}

#[async_trait]
impl Tool for AnalyzeFileTool {
    fn name(&self) -> &str {
        "analyzeFile"
    }

    fn description(&self) -> &str {
        "Analyze an image, PDF, or text file with Gemini. Supported file types: PNG, JPG, GIF, WEBP, SVG, BMP, PDF, text (.txt, .md)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Absolute path to the file to analyze"
                },
                "prompt": {
                    "type": "string",
                    "description": "Analysis instructions (optional)"
                },
                "model": {
                    "type": "string",
                    "description": "Optional model name override"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let file_path = required_str(&args, "file_path")?;
        let prompt =
            optional_str(&args, "prompt").unwrap_or_else(|| DEFAULT_ANALYSIS_PROMPT.to_string());
        let model = optional_str(&args, "model");
        Ok(self
            .cli
            .analyze_file(file_path, &prompt, model.as_deref())
            .await?)
    }
}

/// Render the replay transcript sent when no native handle is usable
pub fn replay_transcript(system: Option<&str>, history: &[HistoryEntry], message: &str) -> String {
    let mut parts = Vec::with_capacity(history.len() + 2);
    if let Some(system) = system {
        parts.push(format!("[System context: {}]", system));
    }
    for entry in history {
        match entry.role {
            Role::User => parts.push(format!("Human: {}", entry.content)),
            Role::Assistant => parts.push(format!("Assistant: {}", entry.content)),
            Role::System => {}
        }
    }
    parts.push(format!("Human: {}", message));
    parts.join("\n\n")
}

/// Gemini sessions: native `--resume` first, transcript replay as fallback
pub struct GeminiSessions {
    cli: Arc<GeminiCli>,
    store: Mutex<SessionStore>,
}

impl GeminiSessions {
    pub fn new(cli: Arc<GeminiCli>) -> Self {
        Self {
            cli,
            store: Mutex::new(SessionStore::new()),
        }
    }
}

#[async_trait]
impl SessionService for GeminiSessions {
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
        let priming_prompt = system.as_deref().unwrap_or(PRIMING_PROMPT);

        let handle = match self.cli.prime(priming_prompt, model.as_deref()).await {
            Ok(reply) => reply.session_id,
            Err(e) => {
                warn!("Priming call for session {} failed: {}", id, e);
                None
            }
        };

        let session = Session::new(&id, model, system).with_native_handle(handle.clone());
        if self.store.lock().await.insert(session).is_some() {
            info!("Session {} recreated", id);
        } else {
            info!("Session {} created (native: {:?})", id, handle);
        }

        match handle {
            Some(handle) => format!("Session created: {} (native session: {})", id, handle),
            None => format!("Session created: {}", id),
        }
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
        session.touch();
        let model = session.model.clone();

        let mut response = None;
        if let Some(handle) = session.native_handle.clone() {
            match self.cli.resume(&handle, message, model.as_deref()).await {
                Ok(text) => response = Some(text),
                Err(e) => {
                    warn!(
                        "Native continuation of {} failed, switching to history replay: {}",
                        session_id, e
                    );
                    session.invalidate_native_handle();
                }
            }
        }

        let response = match response {
            Some(text) => text,
            None => {
                let transcript =
                    replay_transcript(session.system.as_deref(), &session.history, message);
                debug!(
                    "Replaying {} history entries for {}",
                    session.history.len(),
                    session_id
                );
                match self.cli.ask(&transcript, model.as_deref(), true).await {
                    Ok(text) => text,
                    Err(e) => format!("Error: {}", e),
                }
            }
        };

        session.record_turn(message, response.clone());

        if response.is_empty() {
            NO_RESPONSE.to_string()
        } else {
            response
        }
    }

    async fn delete(&self, session_id: &str) -> String {
        let removed = self.store.lock().await.remove(session_id);
        let session = match removed {
            Ok(session) => session,
            Err(_) => return not_found(session_id),
        };

        if let Some(handle) = session.native_handle {
            if let Err(e) = self.cli.delete_native_session(&handle).await {
                warn!(
                    "Could not delete native gemini session {} for {}: {}",
                    handle, session_id, e
                );
            }
        }

        info!("Deleted session {}", session_id);
        format!("Session '{}' deleted.", session_id)
    }
}
