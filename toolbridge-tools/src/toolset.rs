//! Registries for the two servers

use crate::gemini::{AnalyzeFileTool, GeminiChatTool, GeminiSessions, GoogleSearchTool};
use crate::glm::{AnalyzeCodeTool, GlmChatTool, GlmSessions};
use crate::registry::ToolRegistry;
use crate::session::session_tools;
use std::sync::Arc;
use toolbridge_providers::{GeminiCli, LLMProvider};

const GEMINI_CREATE_DESCRIPTION: &str = "Create a new Gemini conversation session. \
Sessions keep context across turns, using Gemini's native session resume when available \
and history replay otherwise.";

const GLM_CREATE_DESCRIPTION: &str = "Create a new GLM conversation session. \
The full history is resent on every turn.";

/// Tools served by `toolbridge serve gemini`
pub fn gemini_registry(cli: Arc<GeminiCli>, default_yolo: bool) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(GeminiChatTool::new(cli.clone(), default_yolo)));
    registry.register(Arc::new(GoogleSearchTool::new(cli.clone())));
    registry.register(Arc::new(AnalyzeFileTool::new(cli.clone())));

    for tool in session_tools(Arc::new(GeminiSessions::new(cli)), GEMINI_CREATE_DESCRIPTION) {
        registry.register(tool);
    }
    registry
}

/// Tools served by `toolbridge serve glm`
pub fn glm_registry(provider: Arc<dyn LLMProvider>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(GlmChatTool::new(provider.clone())));
    registry.register(Arc::new(AnalyzeCodeTool::new(provider.clone())));

    for tool in session_tools(Arc::new(GlmSessions::new(provider)), GLM_CREATE_DESCRIPTION) {
        registry.register(tool);
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeProvider, ScriptedRunner};

    #[test]
    fn test_gemini_tool_names() {
        let registry = gemini_registry(ScriptedRunner::new(vec![]).cli(), true);
        assert_eq!(
            registry.tool_names(),
            vec![
                "analyzeFile",
                "chat",
                "googleSearch",
                "session_chat",
                "session_clear",
                "session_create",
                "session_delete",
                "session_list",
            ]
        );
    }

    #[test]
    fn test_glm_tool_names() {
        let registry = glm_registry(FakeProvider::new(vec![]));
        assert_eq!(
            registry.tool_names(),
            vec![
                "analyze_code",
                "chat",
                "session_chat",
                "session_clear",
                "session_create",
                "session_delete",
                "session_list",
            ]
        );
    }
}
