//! Request identity and entry addressing.

use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// Identity of a GET request inside a store.
///
/// Scheme, host, port, path and query of the request URL. The fragment never
/// takes part in matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn from_url(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Url> for RequestKey {
    fn from(url: &Url) -> Self {
        Self::from_url(url)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the primary key of an entry: one row per (store, request) pair.
pub fn compute_entry_key(cache_name: &str, key: &RequestKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cache_name.as_bytes());
    hasher.update(b"\n");
    hasher.update(key.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> RequestKey {
        RequestKey::from_url(&Url::parse(s).unwrap())
    }

    #[test]
    fn test_fragment_ignored() {
        assert_eq!(key("https://example.com/app.js#v2"), key("https://example.com/app.js"));
    }

    #[test]
    fn test_query_is_part_of_key() {
        assert_ne!(key("https://example.com/app.js?v=1"), key("https://example.com/app.js?v=2"));
    }

    #[test]
    fn test_host_case_normalized() {
        assert_eq!(key("https://EXAMPLE.com/"), key("https://example.com/"));
    }

    #[test]
    fn test_entry_key_stability() {
        let k = key("https://example.com/index.html");
        assert_eq!(compute_entry_key("so-v4", &k), compute_entry_key("so-v4", &k));
    }

    #[test]
    fn test_entry_key_scoped_by_store() {
        let k = key("https://example.com/index.html");
        assert_ne!(compute_entry_key("so-v3", &k), compute_entry_key("so-v4", &k));
    }

    #[test]
    fn test_entry_key_format() {
        let hash = compute_entry_key("so-v4", &key("https://example.com"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
