//! Fetch interception: cache first, then network, then the offline fallback.

use reqwest::{Method, StatusCode};

use super::OfflineCacheProxy;
use crate::fetch::{NetRequest, NetResponse, is_intercepted_scheme};
use shellcache_core::{CacheDb, Error, RequestKey};

/// How an intercepted request was answered.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Not intercepted; the caller goes to the network itself.
    Bypass,
    /// Served from a store without touching the network.
    Cache(NetResponse),
    /// Served from the network. `write_scheduled` is set when a copy is being
    /// written to the current store in the background.
    Network { response: NetResponse, write_scheduled: bool },
    /// The network failed and the offline page stood in.
    Fallback(NetResponse),
    /// The network failed and nothing could stand in.
    Failed(Error),
}

impl FetchOutcome {
    pub fn source(&self) -> &'static str {
        match self {
            FetchOutcome::Bypass => "bypass",
            FetchOutcome::Cache(_) => "cache",
            FetchOutcome::Network { .. } => "network",
            FetchOutcome::Fallback(_) => "fallback",
            FetchOutcome::Failed(_) => "failed",
        }
    }

    pub fn response(&self) -> Option<&NetResponse> {
        match self {
            FetchOutcome::Cache(r) | FetchOutcome::Fallback(r) => Some(r),
            FetchOutcome::Network { response, .. } => Some(response),
            FetchOutcome::Bypass | FetchOutcome::Failed(_) => None,
        }
    }
}

/// Look a key up across every store. A broken entry counts as a miss.
async fn lookup(storage: &CacheDb, key: &RequestKey) -> Option<NetResponse> {
    let stored = match storage.match_any(key).await {
        Ok(stored) => stored?,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "store lookup failed; treating as miss");
            return None;
        }
    };

    match NetResponse::from_stored(stored) {
        Ok(response) => Some(response),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "stored entry unreadable; treating as miss");
            None
        }
    }
}

impl OfflineCacheProxy {
    /// Intercept one request.
    pub async fn fetch(&self, request: &NetRequest) -> FetchOutcome {
        if request.method != Method::GET || !is_intercepted_scheme(&request.url) {
            return FetchOutcome::Bypass;
        }
        if !self.state.read().await.is_controlling() {
            tracing::debug!(url = %request.url, "not controlling; bypass");
            return FetchOutcome::Bypass;
        }

        let key = RequestKey::from_url(&request.url);
        if let Some(response) = lookup(&self.storage, &key).await {
            tracing::debug!(key = %key, "cache hit");
            return FetchOutcome::Cache(response);
        }
        tracing::debug!(key = %key, "cache miss");

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.status != StatusCode::OK || !response.response_type.is_cacheable() {
                    tracing::debug!(
                        key = %key,
                        status = response.status.as_u16(),
                        response_type = %response.response_type,
                        "not storing response"
                    );
                    return FetchOutcome::Network { response, write_scheduled: false };
                }

                let (response, copy) = response.tee();
                self.schedule_write(key, copy);
                FetchOutcome::Network { response, write_scheduled: true }
            }
            Err(e) if request.is_navigation() => {
                let fallback = RequestKey::from_url(&self.config.offline_fallback);
                match lookup(&self.storage, &fallback).await {
                    Some(page) => {
                        tracing::debug!(url = %request.url, fallback = %fallback, error = %e, "offline; serving fallback page");
                        FetchOutcome::Fallback(page)
                    }
                    None => FetchOutcome::Failed(e),
                }
            }
            Err(e) => FetchOutcome::Failed(e),
        }
    }

    /// Write a response copy to the current store without holding up the caller.
    fn schedule_write(&self, key: RequestKey, copy: NetResponse) {
        let storage = self.storage.clone();
        let cache_name = self.config.cache_name.clone();
        self.wait_until.extend(async move {
            let stored = copy.into_stored();
            let result = match storage.open_store(&cache_name).await {
                Ok(store) => store.put(&key, &stored).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => tracing::debug!(cache_name = %cache_name, key = %key, "stored network response"),
                Err(e) => tracing::warn!(cache_name = %cache_name, key = %key, error = %e, "background store write failed"),
            }
        });
    }
}
