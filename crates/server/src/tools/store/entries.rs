//! cache_entries tool implementation.
//!
//! Lists the request keys held by one store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::OfflineCacheProxy;
use shellcache_core::Error;

use crate::tools::json_result;

/// Parameters for the cache_entries tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesParams {
    /// Store name (default: the current store).
    #[serde(default)]
    pub store: Option<String>,
}

/// Output from the cache_entries tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntriesOutput {
    pub store: String,
    /// Request keys in insertion order.
    pub keys: Vec<String>,
    pub count: usize,
}

/// Implementation of the cache_entries tool.
pub async fn entries_impl(proxy: &OfflineCacheProxy, params: CacheEntriesParams) -> Result<CallToolResult, McpError> {
    let name = params.store.unwrap_or_else(|| proxy.config().cache_name.clone());

    let store = proxy
        .storage()
        .existing_store(&name)
        .await?
        .ok_or_else(|| Error::StoreNotFound(name.clone()))?;

    let keys = store.keys().await?;
    let output = CacheEntriesOutput { store: name, count: keys.len(), keys };
    json_result(&output)
}
