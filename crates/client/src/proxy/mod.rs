//! Cache-first offline proxy.
//!
//! Three entry points mirror the lifecycle of an offline worker:
//!
//! - [`OfflineCacheProxy::install`] populates the current store from the
//!   pre-cache list.
//! - [`OfflineCacheProxy::activate`] purges every other store and starts
//!   intercepting.
//! - [`OfflineCacheProxy::fetch`] answers a request from the store, the
//!   network, or the offline fallback.
//!
//! Install and activate are serialized by a lifecycle mutex and only take the
//! state lock for their transitions; fetch handlers only read the state, so they
//! never wait on lifecycle network I/O.

mod activate;
mod install;
mod intercept;
pub mod lifecycle;

use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use url::Url;

pub use activate::ActivateReport;
pub use install::{InstallReport, SkippedUrl};
pub use intercept::FetchOutcome;
pub use lifecycle::{WaitUntil, WorkerState};

use crate::fetch::{NetRequest, NetResponse, Network};
use shellcache_core::{AppConfig, CacheDb, ConfigError, Error, InstallPolicy};

/// Everything the proxy needs to know about the deployed version.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// The one current store name.
    pub cache_name: String,
    pub origin: Url,
    pub precache: Vec<Url>,
    pub offline_fallback: Url,
    pub install_policy: InstallPolicy,
}

impl ProxyConfig {
    /// Resolve the application configuration into proxy settings.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            cache_name: config.cache_name.clone(),
            origin: config.origin()?,
            precache: config.precache_urls()?,
            offline_fallback: config.fallback_url()?,
            install_policy: config.install_policy,
        })
    }
}

/// Offline cache proxy for one deployed version of the app.
pub struct OfflineCacheProxy {
    storage: CacheDb,
    network: Arc<dyn Network>,
    config: ProxyConfig,
    state: RwLock<WorkerState>,
    /// Held for the whole of an install or activate.
    lifecycle: Mutex<()>,
    wait_until: WaitUntil,
}

impl OfflineCacheProxy {
    pub fn new(storage: CacheDb, network: Arc<dyn Network>, config: ProxyConfig) -> Self {
        Self {
            storage,
            network,
            config,
            state: RwLock::new(WorkerState::Parsed),
            lifecycle: Mutex::new(()),
            wait_until: WaitUntil::new(),
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn storage(&self) -> &CacheDb {
        &self.storage
    }

    /// The network the proxy falls through to; bypassed requests go here.
    pub fn network(&self) -> &dyn Network {
        self.network.as_ref()
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Install, then activate straight away.
    ///
    /// This is the skip-waiting + claim path: the new version takes control as
    /// soon as its install settles.
    pub async fn start(&self) -> Result<(InstallReport, ActivateReport), Error> {
        let installed = self.install().await?;
        let activated = self.activate().await?;
        Ok((installed, activated))
    }

    /// Answer a request the way the page would observe it.
    ///
    /// Bypassed requests go to the network untouched; a failure with no
    /// substitute surfaces as the network error.
    pub async fn respond(&self, request: &NetRequest) -> Result<NetResponse, Error> {
        match self.fetch(request).await {
            FetchOutcome::Bypass => self.network().fetch(request).await,
            FetchOutcome::Cache(response) | FetchOutcome::Fallback(response) => Ok(response),
            FetchOutcome::Network { response, .. } => Ok(response),
            FetchOutcome::Failed(e) => Err(e),
        }
    }

    /// Wait until background work started by handlers (store writes) is done.
    pub async fn settled(&self) {
        self.wait_until.settled().await;
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_proxy_config_from_app_config() {
        let app = AppConfig::default();
        let config = ProxyConfig::from_app_config(&app).unwrap();
        assert_eq!(config.cache_name, "so-v4");
        assert_eq!(config.offline_fallback.as_str(), "http://localhost:8080/index.html");
        assert_eq!(config.precache.len(), app.precache.len());
    }

    #[tokio::test]
    async fn test_start_installs_then_activates() {
        let network = FakeNetwork::new();
        network.ok("http://localhost:8080/index.html", "shell");
        let proxy = proxy(network, config(&["./index.html"])).await;

        assert_eq!(proxy.state().await, WorkerState::Parsed);
        let (installed, activated) = proxy.start().await.unwrap();

        assert_eq!(installed.cached.len(), 1);
        assert_eq!(activated.current, "so-v4");
        assert_eq!(proxy.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_respond_bypass_goes_to_network() {
        let network = FakeNetwork::new();
        network.ok("http://localhost:8080/api/save", "saved");
        let proxy = proxy(network.clone(), config(&[])).await;
        proxy.start().await.unwrap();

        let request = NetRequest::get(url("/api/save")).with_method(reqwest::Method::POST);
        let response = proxy.respond(&request).await.unwrap();

        assert_eq!(response.into_body().text(), "saved");
        assert_eq!(network.calls(), 1);
    }

    #[tokio::test]
    async fn test_respond_failure_is_error() {
        let network = FakeNetwork::new();
        let proxy = proxy(network, config(&[])).await;
        proxy.start().await.unwrap();

        let result = proxy.respond(&NetRequest::get(url("/missing.js"))).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
