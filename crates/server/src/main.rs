//! shellcache server entry point.
//!
//! Boots the offline proxy (install, then activate) and serves it as an MCP
//! server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{HttpNetwork, NetworkConfig, OfflineCacheProxy, ProxyConfig};
use shellcache_core::{AppConfig, CacheDb};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let proxy_config = ProxyConfig::from_app_config(&config)?;

    tracing::info!(
        cache_name = %config.cache_name,
        db_path = %config.db_path.display(),
        origin = %proxy_config.origin,
        "Starting shellcache server on stdio transport"
    );

    let storage = CacheDb::open(&config.db_path).await?;
    let network = HttpNetwork::new(NetworkConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.timeout(),
        origin: proxy_config.origin.clone(),
    })?;
    let proxy = Arc::new(OfflineCacheProxy::new(storage, Arc::new(network), proxy_config));

    if let Err(e) = proxy.start().await {
        tracing::warn!(error = %e, state = %proxy.state().await, "proxy did not take control; requests bypass the store");
    }

    let handler = handler::ShellCacheServer::new(proxy.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    proxy.settled().await;

    Ok(())
}
