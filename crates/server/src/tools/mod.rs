//! MCP tool implementations.
//!
//! This module contains all tools exposed by the shellcache server.

pub mod fetch;
pub mod lifecycle;
pub mod store;

pub use fetch::{CacheFetchParams, fetch_impl};
pub use lifecycle::{activate_impl, install_impl};
pub use store::{CacheEntriesParams, entries_impl, keys_impl};

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use shellcache_core::Error;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::Serialization(format!("failed to serialize tool output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
