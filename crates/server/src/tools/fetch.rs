//! cache_fetch tool implementation.
//!
//! Issues a request through the offline proxy and reports where the answer
//! came from.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::fetch::{Method, UrlError, resolve};
use shellcache_client::{FetchOutcome, NetRequest, NetResponse, Network, OfflineCacheProxy};
use shellcache_core::Error;

use super::json_result;

/// Input parameters for the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchParams {
    /// URL to request; relative URLs resolve against the app origin.
    pub url: String,

    /// HTTP method (default: "GET"). Only GET requests are intercepted.
    #[serde(default = "default_method")]
    pub method: String,

    /// Treat the request as a page navigation, which may be answered by the
    /// offline fallback page.
    #[serde(default)]
    pub navigate: bool,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the cache_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheFetchOutput {
    /// The resolved request URL.
    pub url: String,
    /// URL of the response (the stored URL for cache and fallback answers).
    pub final_url: String,
    /// One of "cache", "network", "fallback" or "bypass".
    pub source: String,
    pub status: u16,
    /// "basic", "cors" or "opaque".
    pub response_type: String,
    pub content_type: Option<String>,
    pub body_bytes: usize,
    /// Whether a copy is being written to the current store.
    pub stored: bool,
    /// Body decoded as UTF-8, lossy.
    pub body: String,
}

impl CacheFetchOutput {
    fn new(url: &str, source: &str, response: NetResponse, stored: bool) -> Self {
        Self {
            url: url.to_string(),
            final_url: response.url.to_string(),
            source: source.to_string(),
            status: response.status.as_u16(),
            response_type: response.response_type.to_string(),
            content_type: response.content_type().map(str::to_string),
            body_bytes: response.body_len(),
            stored,
            body: response.into_body().text(),
        }
    }
}

fn parse_request(proxy: &OfflineCacheProxy, params: &CacheFetchParams) -> Result<NetRequest, Error> {
    let url = resolve(&proxy.config().origin, &params.url).map_err(|e| match e {
        UrlError::Empty => Error::InvalidInput("url cannot be empty".into()),
        UrlError::InvalidUrl(msg) => Error::InvalidUrl(format!("{}: {msg}", params.url)),
    })?;

    let method = Method::from_bytes(params.method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::InvalidInput(format!("unsupported method: {}", params.method)))?;

    let request = if params.navigate { NetRequest::navigate(url) } else { NetRequest::get(url) };
    Ok(request.with_method(method))
}

/// Implementation of the cache_fetch tool.
pub async fn fetch_impl(proxy: &OfflineCacheProxy, params: CacheFetchParams) -> Result<CallToolResult, McpError> {
    let request = parse_request(proxy, &params)?;
    let url = request.url.to_string();

    let output = match proxy.fetch(&request).await {
        FetchOutcome::Bypass => {
            let response = proxy.network().fetch(&request).await?;
            CacheFetchOutput::new(&url, "bypass", response, false)
        }
        FetchOutcome::Cache(response) => CacheFetchOutput::new(&url, "cache", response, false),
        FetchOutcome::Network { response, write_scheduled } => {
            CacheFetchOutput::new(&url, "network", response, write_scheduled)
        }
        FetchOutcome::Fallback(response) => CacheFetchOutput::new(&url, "fallback", response, false),
        FetchOutcome::Failed(e) => return Err(e.into()),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn params(url: &str) -> CacheFetchParams {
        CacheFetchParams { url: url.to_string(), method: default_method(), navigate: false }
    }

    #[tokio::test]
    async fn test_fetch_precached_page_from_cache() {
        let (proxy, network) = started_proxy().await;
        network.set_offline(true);

        let result = fetch_impl(&proxy, params("./index.html")).await.unwrap();
        let output: CacheFetchOutput = output(&result);

        assert_eq!(output.source, "cache");
        assert_eq!(output.status, 200);
        assert_eq!(output.body, "<html>shell</html>");
        assert_eq!(output.response_type, "basic");
    }

    #[tokio::test]
    async fn test_fetch_network_then_cache() {
        let (proxy, network) = started_proxy().await;
        network.page("http://localhost:8080/app.js", 200, "console.log(1)");

        let first: CacheFetchOutput = output(&fetch_impl(&proxy, params("/app.js")).await.unwrap());
        assert_eq!(first.source, "network");
        assert!(first.stored);

        proxy.settled().await;
        let second: CacheFetchOutput = output(&fetch_impl(&proxy, params("/app.js")).await.unwrap());
        assert_eq!(second.source, "cache");
        assert_eq!(second.body_bytes, 14);
    }

    #[tokio::test]
    async fn test_fetch_navigation_offline_fallback() {
        let (proxy, network) = started_proxy().await;
        network.set_offline(true);

        let params = CacheFetchParams { url: "/questions/1".into(), method: default_method(), navigate: true };
        let output: CacheFetchOutput = output(&fetch_impl(&proxy, params).await.unwrap());

        assert_eq!(output.source, "fallback");
        assert_eq!(output.url, "http://localhost:8080/questions/1");
        assert_eq!(output.final_url, "http://localhost:8080/index.html");
    }

    #[tokio::test]
    async fn test_fetch_offline_subresource_is_network_error() {
        let (proxy, network) = started_proxy().await;
        network.set_offline(true);

        let err = fetch_impl(&proxy, params("/style.css")).await.unwrap_err();
        assert_eq!(err.code.0, -32006);
    }

    #[tokio::test]
    async fn test_fetch_post_bypasses() {
        let (proxy, network) = started_proxy().await;
        network.page("http://localhost:8080/api", 200, "unused");

        let params = CacheFetchParams { url: "/api".into(), method: "post".into(), navigate: false };
        let output: CacheFetchOutput = output(&fetch_impl(&proxy, params).await.unwrap());

        assert_eq!(output.source, "bypass");
        assert_eq!(output.body, "non-get");
    }

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let (proxy, _) = started_proxy().await;
        let err = fetch_impl(&proxy, params("  ")).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_fetch_invalid_method() {
        let (proxy, _) = started_proxy().await;
        let params = CacheFetchParams { url: "/".into(), method: "GE T".into(), navigate: false };
        let err = fetch_impl(&proxy, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
