//! cache_keys tool implementation.
//!
//! Lists every store name, oldest first.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::OfflineCacheProxy;

use crate::tools::json_result;

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// The store name this version uses.
    pub current: String,
    /// Every store name, in creation order.
    pub stores: Vec<String>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(proxy: &OfflineCacheProxy) -> Result<CallToolResult, McpError> {
    let stores = proxy.storage().store_names().await?;
    let output = CacheKeysOutput { current: proxy.config().cache_name.clone(), stores };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::*;

    #[tokio::test]
    async fn test_keys_after_start() {
        let (proxy, _) = started_proxy().await;

        let output: CacheKeysOutput = output(&keys_impl(&proxy).await.unwrap());

        assert_eq!(output.current, "so-v4");
        assert_eq!(output.stores, vec!["so-v4"]);
    }

    #[tokio::test]
    async fn test_keys_lists_stale_stores_until_activate() {
        let (proxy, _) = started_proxy().await;
        proxy.storage().open_store("so-v5").await.unwrap();

        let output: CacheKeysOutput = output(&keys_impl(&proxy).await.unwrap());
        assert_eq!(output.stores, vec!["so-v4", "so-v5"]);
    }
}
