//! Session tools shared by both tool sets
//!
//! Each backend provides a [`SessionService`]; the five tools here only
//! unpack arguments and delegate, so both servers expose the same shape.

use crate::base::{optional_str, required_str, Result, Tool};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use toolbridge_core::session::SessionStore;
use tracing::info;

/// Error text for an unknown session id
pub fn not_found(session_id: &str) -> String {
    format!("Error: Session '{}' not found.", session_id)
}

/// Conversation lifecycle for one backend.
///
/// Every method yields text: confirmations, answers, or `Error: ...`.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// The store owned by this service
    fn store(&self) -> &Mutex<SessionStore>;

    async fn create(
        &self,
        session_id: Option<String>,
        system: Option<String>,
        model: Option<String>,
    ) -> String;

    async fn chat(&self, session_id: &str, message: &str) -> String;

    /// JSON array of summaries, or a plain message when there are none
    async fn list(&self) -> String {
        let store = self.store().lock().await;
        if store.is_empty() {
            return "No active sessions.".to_string();
        }
        serde_json::to_string_pretty(&store.summaries())
            .unwrap_or_else(|e| format!("Error: {}", e))
    }

    async fn delete(&self, session_id: &str) -> String {
        match self.store().lock().await.remove(session_id) {
            Ok(_) => {
                info!("Deleted session {}", session_id);
                format!("Session '{}' deleted.", session_id)
            }
            Err(_) => not_found(session_id),
        }
    }

    async fn clear(&self, session_id: &str) -> String {
        let mut store = self.store().lock().await;
        match store.get_mut(session_id) {
            Ok(session) => {
                session.clear();
                info!("Cleared session {}", session_id);
                format!(
                    "Session '{}' history cleared (system context preserved).",
                    session_id
                )
            }
            Err(_) => not_found(session_id),
        }
    }
}

/// `session_create`
pub struct SessionCreateTool {
    service: Arc<dyn SessionService>,
    description: String,
}

impl SessionCreateTool {
    pub fn new(service: Arc<dyn SessionService>, description: impl Into<String>) -> Self {
        Self {
            service,
            description: description.into(),
        }
    }
}

#[async_trait]
impl Tool for SessionCreateTool {
    fn name(&self) -> &str {
        "session_create"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Optional custom session ID. Auto-generated (8 characters) if not provided."
                },
                "system": {
                    "type": "string",
                    "description": "Optional system context/instructions for this session"
                },
                "model": {
                    "type": "string",
                    "description": "Optional model name override"
                }
            },
            "required": []
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        Ok(self
            .service
            .create(
                optional_str(&args, "session_id"),
                optional_str(&args, "system"),
                optional_str(&args, "model"),
            )
            .await)
    }
}

/// `session_chat`
pub struct SessionChatTool {
    service: Arc<dyn SessionService>,
}

impl SessionChatTool {
    pub fn new(service: Arc<dyn SessionService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SessionChatTool {
    fn name(&self) -> &str {
        "session_chat"
    }

    fn description(&self) -> &str {
        "Send a message within a session, maintaining conversation context."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Session ID returned by session_create"
                },
                "message": {
                    "type": "string",
                    "description": "User message to send"
                }
            },
            "required": ["session_id", "message"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let session_id = required_str(&args, "session_id")?;
        let message = required_str(&args, "message")?;
        Ok(self.service.chat(session_id, message).await)
    }
}

/// `session_list`
pub struct SessionListTool {
    service: Arc<dyn SessionService>,
}

impl SessionListTool {
    pub fn new(service: Arc<dyn SessionService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SessionListTool {
    fn name(&self) -> &str {
        "session_list"
    }

    fn description(&self) -> &str {
        "List all active sessions with metadata (JSON array)."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: Value) -> Result<String> {
        Ok(self.service.list().await)
    }
}

/// `session_delete`
pub struct SessionDeleteTool {
    service: Arc<dyn SessionService>,
}

impl SessionDeleteTool {
    pub fn new(service: Arc<dyn SessionService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SessionDeleteTool {
    fn name(&self) -> &str {
        "session_delete"
    }

    fn description(&self) -> &str {
        "Delete a session and clean up its resources."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Session ID to delete"
                }
            },
            "required": ["session_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let session_id = required_str(&args, "session_id")?;
        Ok(self.service.delete(session_id).await)
    }
}

/// `session_clear`
pub struct SessionClearTool {
    service: Arc<dyn SessionService>,
}

impl SessionClearTool {
    pub fn new(service: Arc<dyn SessionService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Tool for SessionClearTool {
    fn name(&self) -> &str {
        "session_clear"
    }

    fn description(&self) -> &str {
        "Clear conversation history while keeping the session and its system context."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "session_id": {
                    "type": "string",
                    "description": "Session ID to clear"
                }
            },
            "required": ["session_id"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let session_id = required_str(&args, "session_id")?;
        Ok(self.service.clear(session_id).await)
    }
}

/// Wrap a service in the five session tools
pub fn session_tools(
    service: Arc<dyn SessionService>,
    create_description: &str,
) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(SessionCreateTool::new(service.clone(), create_description)),
        Arc::new(SessionChatTool::new(service.clone())),
        Arc::new(SessionListTool::new(service.clone())),
        Arc::new(SessionDeleteTool::new(service.clone())),
        Arc::new(SessionClearTool::new(service)),
    ]
}
