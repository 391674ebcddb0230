//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! The current store name lives here and is handed to the proxy at startup;
//! nothing else in the workspace names a store.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Asset list pre-cached at install time. Relative entries resolve against
/// `app_origin`.
pub const DEFAULT_PRECACHE: &[&str] = &[
    "./",
    "./index.html",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/webfonts/fa-solid-900.woff2",
    "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/webfonts/fa-regular-400.woff2",
    "https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.min.js",
    "https://cdnjs.cloudflare.com/ajax/libs/pdf.js/3.11.174/pdf.worker.min.js",
    "https://i.postimg.cc/qBPrY3K7/A-professional-square-2k-202602181742.jpg",
    "https://i.postimg.cc/HxQzPdM1/Create-a-highresolution-2k-202602180610.jpg",
];

/// How install treats a pre-cache URL that fails to fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPolicy {
    /// Log and skip the failing URL; partial population is a valid outcome.
    #[default]
    BestEffort,
    /// Any failing URL aborts the install and nothing is written.
    Strict,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Name of the current, version-tagged store.
    ///
    /// Set via SHELLCACHE_CACHE_NAME environment variable. Bumping it makes the
    /// next activation purge every other store.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SHELLCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin of the app shell; relative URLs resolve against it and responses
    /// from it are classified same-origin.
    ///
    /// Set via SHELLCACHE_APP_ORIGIN environment variable.
    #[serde(default = "default_app_origin")]
    pub app_origin: String,

    /// URLs fetched and stored at install time.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Page served to navigations when the network is unreachable.
    ///
    /// Set via SHELLCACHE_OFFLINE_FALLBACK environment variable.
    #[serde(default = "default_offline_fallback")]
    pub offline_fallback: String,

    /// Set via SHELLCACHE_INSTALL_POLICY (`best_effort` or `strict`).
    #[serde(default)]
    pub install_policy: InstallPolicy,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHELLCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Transport timeout in milliseconds. Unset leaves the HTTP client default.
    ///
    /// Set via SHELLCACHE_TIMEOUT_MS environment variable.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_cache_name() -> String {
    "so-v4".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_app_origin() -> String {
    "http://localhost:8080/".into()
}

fn default_precache() -> Vec<String> {
    DEFAULT_PRECACHE.iter().map(|s| s.to_string()).collect()
}

fn default_offline_fallback() -> String {
    "./index.html".into()
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            db_path: default_db_path(),
            app_origin: default_app_origin(),
            precache: default_precache(),
            offline_fallback: default_offline_fallback(),
            install_policy: InstallPolicy::default(),
            user_agent: default_user_agent(),
            timeout_ms: None,
        }
    }
}

impl AppConfig {
    /// Transport timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// The app origin as a parsed URL.
    pub fn origin(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.app_origin)
            .map_err(|e| ConfigError::Invalid { field: "app_origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => {
                Err(ConfigError::Invalid { field: "app_origin".into(), reason: format!("unsupported scheme: {scheme}") })
            }
        }
    }

    /// Resolve a possibly relative URL against the app origin.
    pub fn resolve(&self, input: &str) -> Result<Url, ConfigError> {
        self.origin()?
            .join(input.trim())
            .map_err(|e| ConfigError::Invalid { field: input.to_string(), reason: e.to_string() })
    }

    /// Pre-cache list with every entry resolved, in configured order.
    pub fn precache_urls(&self) -> Result<Vec<Url>, ConfigError> {
        self.precache.iter().map(|u| self.resolve(u)).collect()
    }

    /// Offline fallback page, resolved.
    pub fn fallback_url(&self) -> Result<Url, ConfigError> {
        self.resolve(&self.offline_fallback)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELLCACHE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
