//! Client code for shellcache.
//!
//! This crate provides the network boundary and the cache-first offline proxy
//! shared by the server.

pub mod fetch;
pub mod proxy;

pub use fetch::{Body, HttpNetwork, NetRequest, NetResponse, Network, NetworkConfig, RequestMode};

pub use proxy::{
    ActivateReport, FetchOutcome, InstallReport, OfflineCacheProxy, ProxyConfig, SkippedUrl, WaitUntil, WorkerState,
};
