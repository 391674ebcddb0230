//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Cache storage with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, RequestKey, ResponseType, Store, StoredResponse};
pub use config::{AppConfig, ConfigError, InstallPolicy};
pub use error::Error;
