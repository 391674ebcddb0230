//! cache_install and cache_activate tool implementations.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{ActivateReport, InstallReport, OfflineCacheProxy};

use super::json_result;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SkippedOutput {
    pub url: String,
    pub reason: String,
}

/// Output structure for the cache_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInstallOutput {
    pub cache_name: String,
    /// "best_effort" or "strict".
    pub policy: String,
    /// Pre-cache URLs now stored.
    pub cached: Vec<String>,
    /// Pre-cache URLs that failed, with the reason.
    pub skipped: Vec<SkippedOutput>,
    /// Lifecycle state after the install.
    pub state: String,
}

impl CacheInstallOutput {
    fn new(report: InstallReport, state: String) -> Self {
        let policy = serde_json::to_value(report.policy)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Self {
            cache_name: report.cache_name,
            policy,
            cached: report.cached,
            skipped: report
                .skipped
                .into_iter()
                .map(|s| SkippedOutput { url: s.url, reason: s.reason })
                .collect(),
            state,
        }
    }
}

/// Output structure for the cache_activate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheActivateOutput {
    /// The store that stays.
    pub current: String,
    /// Stores deleted by this activation.
    pub deleted: Vec<String>,
    pub state: String,
}

impl CacheActivateOutput {
    fn new(report: ActivateReport, state: String) -> Self {
        Self { current: report.current, deleted: report.deleted, state }
    }
}

/// Implementation of the cache_install tool.
pub async fn install_impl(proxy: &OfflineCacheProxy) -> Result<CallToolResult, McpError> {
    let report = proxy.install().await?;
    let state = proxy.state().await.to_string();
    json_result(&CacheInstallOutput::new(report, state))
}

/// Implementation of the cache_activate tool.
pub async fn activate_impl(proxy: &OfflineCacheProxy) -> Result<CallToolResult, McpError> {
    let report = proxy.activate().await?;
    let state = proxy.state().await.to_string();
    json_result(&CacheActivateOutput::new(report, state))
}
