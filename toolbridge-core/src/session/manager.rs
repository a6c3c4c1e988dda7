//! In-memory session store

use super::store::{Session, SessionSummary};
use std::collections::HashMap;

/// Process-lifetime mapping from session identifier to conversation state.
///
/// Owned by whichever tool set uses it; nothing is persisted.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Insert a session, replacing any existing one with the same id
    pub fn insert(&mut self, session: Session) -> Option<Session> {
        self.sessions.insert(session.id.clone(), session)
    }

    /// Get a session if it exists
    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Get a mutable session or a `NotFound` error
    pub fn get_mut(&mut self, id: &str) -> crate::Result<&mut Session> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| crate::Error::NotFound(format!("session '{}'", id)))
    }

    /// Remove a session, returning it
    pub fn remove(&mut self, id: &str) -> crate::Result<Session> {
        self.sessions
            .remove(id)
            .ok_or_else(|| crate::Error::NotFound(format!("session '{}'", id)))
    }

    /// Check if a session exists
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Summaries ordered by creation time, then id
    pub fn summaries(&self) -> Vec<SessionSummary> {
        let mut sessions: Vec<&Session> = self.sessions.values().collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        sessions.into_iter().map(Session::summary).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
