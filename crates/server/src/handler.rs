//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the offline proxy.
use crate::tools::{
    CacheEntriesParams, CacheFetchParams, activate_impl, entries_impl, fetch_impl, install_impl, keys_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellcache_client::OfflineCacheProxy;
use std::sync::Arc;

/// The main MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellCacheServer {
    tool_router: ToolRouter<Self>,
    proxy: Arc<OfflineCacheProxy>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellCacheServer {
    /// Create a new server handler around a started proxy.
    pub fn new(proxy: Arc<OfflineCacheProxy>) -> Self {
        Self { tool_router: Self::tool_router(), proxy }
    }

    /// Request a URL through the offline proxy.
    ///
    /// GET requests are answered from the store first, then the network; page
    /// navigations fall back to the offline page when the network is down.
    #[tool(
        description = "Request a URL through the cache-first offline proxy. Returns the source (cache, network, fallback, bypass), status, and body."
    )]
    async fn cache_fetch(&self, params: Parameters<CacheFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.proxy, params.0).await
    }

    /// Re-run install: fetch the pre-cache list into the current store.
    #[tool(description = "Fetch every pre-cache URL into the current store. Returns cached and skipped URLs.")]
    async fn cache_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.proxy).await
    }

    /// Re-run activate: purge every store but the current one.
    #[tool(description = "Delete every store except the current one and take control of fetches.")]
    async fn cache_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.proxy).await
    }

    #[tool(description = "List every store name and the current store name.")]
    async fn cache_keys(&self) -> Result<CallToolResult, McpError> {
        keys_impl(&self.proxy).await
    }

    #[tool(description = "List the request URLs stored in a store (default: the current store).")]
    async fn cache_entries(&self, params: Parameters<CacheEntriesParams>) -> Result<CallToolResult, McpError> {
        entries_impl(&self.proxy, params.0).await
    }
}

impl ServerHandler for ShellCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::started_proxy;

    #[tokio::test]
    async fn test_tool_router_lists_every_tool() {
        let (proxy, _) = started_proxy().await;
        let server = ShellCacheServer::new(proxy);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();

        assert_eq!(names, vec!["cache_activate", "cache_entries", "cache_fetch", "cache_install", "cache_keys"]);
    }

    #[tokio::test]
    async fn test_server_info() {
        let (proxy, _) = started_proxy().await;
        let info = ShellCacheServer::new(proxy).get_info();
        assert_eq!(info.server_info.name, "shellcache");
        assert!(info.capabilities.tools.is_some());
    }
}
