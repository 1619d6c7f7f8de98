//! SpotMux MCP Handler
//!
//! Implements the MCP ServerHandler trait over the Tool Dispatcher. Tool
//! failures come back as `is_error` results, never as protocol errors.

use rmcp::{model::*, service::RequestContext, ErrorData as McpError, RoleServer, ServerHandler};
use tracing::{debug, Instrument};

use crate::logging::{InvocationContext, InvocationSpan};
use crate::tools::{tool_definitions, ToolDispatcher};

#[derive(Clone)]
pub struct SpotifyMcpHandler {
    dispatcher: ToolDispatcher,
}

impl SpotifyMcpHandler {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Run one tool call and shape the result for the client
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let ctx = InvocationContext::new(name);
        InvocationSpan::log_entry(&ctx);

        let outcome = self
            .dispatcher
            .dispatch(name, arguments)
            .instrument(InvocationSpan::enter(&ctx))
            .await;

        match outcome {
            Ok(output) => {
                InvocationSpan::log_exit(&ctx, Ok(()));
                CallToolResult::success(vec![Content::text(output.render())])
            }
            Err(e) => {
                InvocationSpan::log_exit(&ctx, Err(&e.to_string()));
                CallToolResult::error(vec![Content::text(e.user_message())])
            }
        }
    }
}

impl ServerHandler for SpotifyMcpHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "spotmux".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Control Spotify playback, search the catalog, manage the queue and playlists. \
                 Authorization is shared through the SpotMux token backend."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _params: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = tool_definitions();
        debug!(count = tools.len(), "list_tools");
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        params: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.invoke(&params.name, params.arguments).await)
    }
}
