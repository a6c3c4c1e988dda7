//! Tools for toolbridge
//!
//! This crate provides the tool registry, the Gemini and GLM tool sets with
//! their session services, and the stdio MCP server that hosts them.

pub mod base;
pub mod gemini;
pub mod glm;
pub mod mcp;
pub mod registry;
pub mod session;
pub mod toolset;

#[cfg(test)]
mod testing;

pub use base::{Tool, ToolError};
pub use gemini::{AnalyzeFileTool, GeminiChatTool, GeminiSessions, GoogleSearchTool};
pub use glm::{AnalyzeCodeTool, GlmChatTool, GlmSessions};
pub use mcp::McpServer;
pub use registry::ToolRegistry;
pub use session::{session_tools, SessionService};
pub use toolset::{gemini_registry, glm_registry};
