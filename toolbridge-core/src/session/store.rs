//! Session data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{format_local, preview};

/// Characters of the system prompt shown in listings
pub const SYSTEM_PREVIEW_CHARS: usize = 80;

/// Role of a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A role-tagged history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A conversation session.
///
/// History holds at most one `system` entry, always first, followed by
/// `user`/`assistant` pairs. The native handle is only ever set by a
/// backend that issues one; once dropped it stays dropped until the
/// session is recreated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Store key
    pub id: String,
    /// Backend-issued session token used for native continuation
    pub native_handle: Option<String>,
    /// Model override; `None` means the backend default
    pub model: Option<String>,
    /// System context fixed at creation
    pub system: Option<String>,
    /// Replay transcript
    pub history: Vec<HistoryEntry>,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

impl Session {
    /// Create a session, seeding history with the system entry if any
    pub fn new(id: impl Into<String>, model: Option<String>, system: Option<String>) -> Self {
        let now = Utc::now();
        let mut history = Vec::new();
        if let Some(system) = &system {
            history.push(HistoryEntry::new(Role::System, system.clone()));
        }

        Self {
            id: id.into(),
            native_handle: None,
            model,
            system,
            history,
            created_at: now,
            last_used: now,
        }
    }

    /// Attach a native handle obtained at creation time
    pub fn with_native_handle(mut self, handle: Option<String>) -> Self {
        self.native_handle = handle;
        self
    }

    /// Append one user/assistant pair and mark the session used
    pub fn record_turn(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.history.push(HistoryEntry::new(Role::User, user));
        self.history.push(HistoryEntry::new(Role::Assistant, assistant));
        self.touch();
    }

    /// Drop the native handle; later turns use history replay
    pub fn invalidate_native_handle(&mut self) -> Option<String> {
        self.native_handle.take()
    }

    /// Keep only the system entry and forget the native handle
    pub fn clear(&mut self) {
        self.history.retain(|entry| entry.role == Role::System);
        self.native_handle = None;
        self.touch();
    }

    /// Update the last-used time
    pub fn touch(&mut self) {
        self.last_used = Utc::now();
    }

    /// Number of completed turns (user entries)
    pub fn turn_count(&self) -> usize {
        self.history
            .iter()
            .filter(|entry| entry.role == Role::User)
            .count()
    }

    /// Build the listing view of this session
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            model: self.model.clone(),
            native_session_id: self.native_handle.clone(),
            turn_count: self.turn_count(),
            system: self
                .system
                .as_deref()
                .map(|s| preview(s, SYSTEM_PREVIEW_CHARS)),
            created_at: format_local(&self.created_at),
            last_used: format_local(&self.last_used),
        }
    }
}

/// Listing view of a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub id: String,
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_session_id: Option<String>,
    pub turn_count: usize,
    pub system: Option<String>,
    pub created_at: String,
    pub last_used: String,
}
