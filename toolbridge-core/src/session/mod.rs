//! Conversation sessions
//!
//! Sessions live only in process memory. Each tool set owns one
//! [`SessionStore`].

pub mod manager;
pub mod store;

pub use manager::SessionStore;
pub use store::{HistoryEntry, Role, Session, SessionSummary, SYSTEM_PREVIEW_CHARS};
