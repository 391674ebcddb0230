//! Install: populate the current store from the pre-cache list.

use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

use super::{OfflineCacheProxy, WorkerState};
use crate::fetch::{NetRequest, NetResponse, Network};
use shellcache_core::{Error, InstallPolicy, RequestKey, StoredResponse};

/// A pre-cache URL that did not make it into the store.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedUrl {
    pub url: String,
    pub reason: String,
}

/// Outcome of an install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub cache_name: String,
    pub policy: InstallPolicy,
    /// URLs now in the store, in pre-cache order.
    pub cached: Vec<String>,
    /// URLs that failed, in pre-cache order. Always empty after a strict install.
    pub skipped: Vec<SkippedUrl>,
}

/// Fetch one URL for the store, with `Cache.add` acceptance rules.
async fn fetch_for_store(network: &dyn Network, url: Url) -> Result<NetResponse, Error> {
    let request = NetRequest::get(url);
    let response = network.fetch(&request).await?;

    if !response.status.is_success() {
        return Err(Error::HttpError(format!("status {}", response.status.as_u16())));
    }
    if !response.response_type.is_cacheable() {
        return Err(Error::HttpError("cross-origin response without CORS headers".into()));
    }
    Ok(response)
}

impl OfflineCacheProxy {
    /// Populate the current store from the pre-cache list.
    ///
    /// Every URL is fetched concurrently and independently. Under
    /// [`InstallPolicy::BestEffort`] a failing URL is logged and skipped;
    /// under [`InstallPolicy::Strict`] any failure aborts the install before
    /// anything is written.
    ///
    /// Install may be re-run on a controlling proxy to re-populate the store;
    /// the proxy keeps control in that case, whatever the outcome, and keeps
    /// answering fetches while the pre-cache list downloads.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let _lifecycle = self.lifecycle.lock().await;

        let previous = {
            let mut state = self.state.write().await;
            let previous = *state;
            if previous != WorkerState::Activated {
                *state = WorkerState::Installing;
            }
            previous
        };
        tracing::info!(cache_name = %self.config.cache_name, policy = ?self.config.install_policy, "install started");

        let result = self.populate().await;

        *self.state.write().await = match (&result, previous) {
            (_, WorkerState::Activated) => WorkerState::Activated,
            (Ok(_), _) => WorkerState::Installed,
            (Err(_), _) => WorkerState::Redundant,
        };

        match &result {
            Ok(report) => tracing::info!(
                cache_name = %report.cache_name,
                cached = report.cached.len(),
                skipped = report.skipped.len(),
                "install complete; ready to activate"
            ),
            Err(e) => tracing::warn!(cache_name = %self.config.cache_name, error = %e, "install failed"),
        }

        result
    }

    async fn populate(&self) -> Result<InstallReport, Error> {
        let store = self.storage.open_store(&self.config.cache_name).await?;

        let mut tasks = JoinSet::new();
        for (index, url) in self.config.precache.iter().cloned().enumerate() {
            let network: Arc<dyn Network> = self.network.clone();
            tasks.spawn(async move {
                let result = fetch_for_store(network.as_ref(), url.clone()).await;
                (index, url, result)
            });
        }

        let mut results = Vec::with_capacity(self.config.precache.len());
        while let Some(joined) = tasks.join_next().await {
            results.push(joined?);
        }
        results.sort_by_key(|(index, _, _)| *index);

        let mut report = InstallReport {
            cache_name: self.config.cache_name.clone(),
            policy: self.config.install_policy,
            cached: Vec::new(),
            skipped: Vec::new(),
        };

        match self.config.install_policy {
            InstallPolicy::BestEffort => {
                for (_, url, result) in results {
                    let stored = match result {
                        Ok(response) => store.put(&RequestKey::from_url(&url), &response.into_stored()).await,
                        Err(e) => Err(e),
                    };
                    match stored {
                        Ok(()) => report.cached.push(url.to_string()),
                        Err(e) => {
                            tracing::warn!(url = %url, error = %e, "pre-cache skip");
                            report.skipped.push(SkippedUrl { url: url.to_string(), reason: e.to_string() });
                        }
                    }
                }
            }
            InstallPolicy::Strict => {
                let mut entries: Vec<(RequestKey, StoredResponse)> = Vec::with_capacity(results.len());
                let mut failures = Vec::new();
                for (_, url, result) in results {
                    match result {
                        Ok(response) => entries.push((RequestKey::from_url(&url), response.into_stored())),
                        Err(e) => failures.push(format!("{url}: {e}")),
                    }
                }
                if !failures.is_empty() {
                    return Err(Error::InstallFailed(failures.join("; ")));
                }

                report.cached = entries.iter().map(|(key, _)| key.to_string()).collect();
                store.put_all(entries).await?;
            }
        }

        Ok(report)
    }
}
