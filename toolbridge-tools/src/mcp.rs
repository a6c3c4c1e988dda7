//! MCP server that publishes a tool registry over rmcp

use super::base::Tool;
use super::registry::ToolRegistry;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool as McpTool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RmcpError, RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

/// Serves one tool registry to a single client
#[derive(Clone)]
pub struct McpServer {
    name: String,
    version: String,
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            registry,
        }
    }

    /// Registry tools in listing order, as MCP tool descriptors
    pub fn tool_infos(&self) -> Vec<McpTool> {
        self.registry
            .tools()
            .iter()
            .map(|tool| to_mcp_tool(tool.as_ref()))
            .collect()
    }

    /// Run a tool and wrap its text; `Error:` text is flagged as a tool error
    pub async fn call(&self, name: &str, arguments: Option<JsonObject>) -> CallToolResult {
        let arguments = Value::Object(arguments.unwrap_or_default());
        let text = self.registry.execute(name, arguments).await;

        if text.starts_with("Error:") {
            debug!("Tool {} returned an error result", name);
            CallToolResult::error(vec![Content::text(text)])
        } else {
            CallToolResult::success(vec![Content::text(text)])
        }
    }

    /// Serve until the client closes the connection
    pub async fn serve_io<R, W>(self, reader: R, writer: W) -> Result<(), RmcpError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let name = self.name.clone();
        let service = self.serve((reader, writer)).await?;
        let reason = service.waiting().await?;
        info!("MCP session for '{}' ended: {:?}", name, reason);
        Ok(())
    }

    pub async fn serve_stdio(self) -> Result<(), RmcpError> {
        info!(
            "Serving {} tools as '{}' on stdio",
            self.registry.len(),
            self.name
        );
        self.serve_io(tokio::io::stdin(), tokio::io::stdout()).await
    }
}

fn to_mcp_tool(tool: &dyn Tool) -> McpTool {
    let schema = match tool.parameters() {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    };
    McpTool::new(
        tool.name().to_string(),
        tool.description().to_string(),
        Arc::new(schema),
    )
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(format!("Tools: {}", self.registry.tool_names().join(", "))),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tool_infos()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.call(&request.name, request.arguments).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{required_str, Result};
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::io::{
        AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
    };
    use tokio::task::JoinHandle;

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase the text"
        }

        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            })
        }

        async fn execute(&self, args: Value) -> Result<String> {
            Ok(required_str(&args, "text")?.to_uppercase())
        }
    }

    fn server() -> McpServer {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(UpperTool));
        McpServer::new("test-server", "0.1.0", Arc::new(registry))
    }

    /// Line-oriented JSON-RPC peer on the far end of an in-memory pipe
    struct Client {
        writer: WriteHalf<DuplexStream>,
        lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    }

    impl Client {
        async fn send(&mut self, message: Value) {
            let mut line = message.to_string();
            line.push('\n');
            self.writer.write_all(line.as_bytes()).await.unwrap();
        }

        async fn request(&mut self, message: Value) -> Value {
            self.send(message).await;
            let line = self.lines.next_line().await.unwrap().unwrap();
            serde_json::from_str(&line).unwrap()
        }
    }

    async fn connect() -> (Client, Value, JoinHandle<std::result::Result<(), RmcpError>>) {
        let (server_io, client_io) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_io);
        let handle = tokio::spawn(server().serve_io(server_read, server_write));

        let (client_read, client_write) = tokio::io::split(client_io);
        let mut client = Client {
            writer: client_write,
            lines: BufReader::new(client_read).lines(),
        };
        let init = client
            .request(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0"}
                }
            }))
            .await;
        client
            .send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
        (client, init, handle)
    }

    #[test]
    fn test_tool_infos_carry_input_schema() {
        let tools = server().tool_infos();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "upper");
        assert_eq!(tools[0].input_schema["required"][0], "text");
    }

    #[test]
    fn test_info_names_server_and_enables_tools() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, "test-server");
        assert_eq!(info.server_info.version, "0.1.0");
        assert!(info.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn test_call_flags_error_text() {
        let server = server();
        let mut args = JsonObject::new();
        args.insert("text".to_string(), json!("hi"));
        let ok = serde_json::to_value(server.call("upper", Some(args)).await).unwrap();
        assert_eq!(ok["content"][0]["text"], "HI");
        assert_ne!(ok["isError"], true);

        let missing = serde_json::to_value(server.call("ghost", None).await).unwrap();
        assert_eq!(missing["isError"], true);
        assert_eq!(
            missing["content"][0]["text"],
            "Error: Tool 'ghost' not found"
        );
    }

    #[tokio::test]
    async fn test_handshake_list_and_call_over_transport() {
        let (mut client, init, handle) = connect().await;
        assert_eq!(init["id"], 1);
        assert_eq!(init["result"]["serverInfo"]["name"], "test-server");
        assert!(init["result"]["protocolVersion"].is_string());
        assert!(init["result"]["capabilities"]["tools"].is_object());

        let listed = client
            .request(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
            .await;
        let tools = listed["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "upper");
        assert!(tools[0]["inputSchema"].is_object());

        let called = client
            .request(json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {"name": "upper", "arguments": {"text": "x"}}
            }))
            .await;
        assert_eq!(called["id"], 3);
        assert_eq!(called["result"]["content"][0]["text"], "X");

        let invalid = client
            .request(json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "upper", "arguments": {}}
            }))
            .await;
        assert_eq!(invalid["result"]["isError"], true);

        drop(client);
        assert!(handle.await.unwrap().is_ok());
    }
}
