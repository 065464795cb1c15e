//! [`rmcp`] server handler exposing the dispatcher over MCP.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};

use crate::dispatch::Dispatcher;
use crate::tools::{ToolDescriptor, list_tools};
use crate::types::{ContentItem, ResponseEnvelope};

/// Name advertised in the MCP `initialize` response.
pub const SERVER_NAME: &str = "places402-mcp";

const INSTRUCTIONS: &str = "Search for places with search_places. Searches are paid \
    automatically with x402 micropayments when a wallet is configured, otherwise demo \
    results are returned. Use get_service_info and check_health to inspect the backend.";

/// MCP server backed by a [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct PlacesServer {
    dispatcher: Arc<Dispatcher>,
}

impl PlacesServer {
    /// Wraps a dispatcher.
    #[must_use]
    pub const fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

/// Converts a registry entry to an rmcp [`Tool`].
#[must_use]
pub fn tool_to_rmcp(descriptor: &ToolDescriptor) -> Tool {
    Tool::new(
        descriptor.name.as_str(),
        descriptor.description,
        Arc::new(descriptor.input_schema.clone()),
    )
}

/// Converts an envelope to an rmcp [`CallToolResult`].
#[must_use]
pub fn envelope_to_rmcp(envelope: &ResponseEnvelope) -> CallToolResult {
    let content = envelope
        .content
        .iter()
        .filter_map(ContentItem::as_text)
        .map(Content::text)
        .collect();
    if envelope.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}

impl ServerHandler for PlacesServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                ..Implementation::default()
            },
            instructions: Some(INSTRUCTIONS.to_owned()),
            ..ServerInfo::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(
            list_tools().iter().map(tool_to_rmcp).collect(),
        ))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        let envelope = self.dispatcher.invoke(&request.name, &arguments).await;
        Ok(envelope_to_rmcp(&envelope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn server() -> PlacesServer {
        let dispatcher = Dispatcher::from_settings(Settings::new("http://127.0.0.1:9").unwrap())
            .unwrap();
        PlacesServer::new(Arc::new(dispatcher))
    }

    #[test]
    fn advertises_tools_capability() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert!(info.capabilities.tools.is_some());
    }

    #[test]
    fn converts_registry_entries() {
        let tools: Vec<_> = list_tools().iter().map(tool_to_rmcp).collect();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert_eq!(names, ["search_places", "get_service_info", "check_health"]);
        assert_eq!(tools[0].input_schema["required"], serde_json::json!(["query"]));
    }

    #[test]
    fn error_flag_survives_conversion() {
        let error = envelope_to_rmcp(&ResponseEnvelope::text("boom".to_owned(), true));
        assert_eq!(error.is_error, Some(true));
        let ok = envelope_to_rmcp(&ResponseEnvelope::text("fine".to_owned(), false));
        assert_eq!(ok.is_error, Some(false));
        assert_eq!(ok.content.len(), 1);
    }
}
