//! Configuration validation rules.
//!
//! Checks run on `AppConfig` after it has been loaded from environment,
//! files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `cache_name` is blank, and
    /// `ConfigError::Invalid` if:
    /// - `app_origin` is not an absolute http(s) URL
    /// - a `precache` entry or `offline_fallback` does not resolve against it
    /// - `timeout_ms` is set below 100ms or above 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_name".into(),
                hint: "Set SHELLCACHE_CACHE_NAME to a version-tagged store name".into(),
            });
        }

        self.origin()?;
        self.precache_urls()?;
        self.fallback_url()?;

        if let Some(timeout_ms) = self.timeout_ms {
            if timeout_ms < 100 {
                return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
            }
            if timeout_ms > 300_000 {
                return Err(ConfigError::Invalid {
                    field: "timeout_ms".into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.precache.is_empty() {
            tracing::warn!(cache_name = %self.cache_name, "precache list is empty; install will only create the store");
        } else if !self.precache.iter().any(|u| self.resolve(u).ok() == self.fallback_url().ok()) {
            tracing::warn!(
                offline_fallback = %self.offline_fallback,
                "offline fallback is not in the precache list; offline navigations may get no response"
            );
        }

        Ok(())
    }
}
