//! Stored response representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visibility class of a response relative to the app origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    Basic,
    /// Cross-origin response the server explicitly shared.
    Cors,
    /// Cross-origin response whose contents must not be trusted.
    Opaque,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
        }
    }

    /// Whether responses of this type may be written to a store by fetch handling.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, ResponseType::Basic | ResponseType::Cors)
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(ResponseType::Basic),
            "cors" => Ok(ResponseType::Cors),
            "opaque" => Ok(ResponseType::Opaque),
            other => Err(format!("unknown response type: {other}")),
        }
    }
}

/// A response as persisted in a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    /// URL the response was actually fetched from (after redirects).
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub response_type: ResponseType,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// RFC 3339 timestamp of the write.
    pub stored_at: String,
}

impl StoredResponse {
    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_type_parse() {
        assert_eq!("cors".parse::<ResponseType>().unwrap(), ResponseType::Cors);
        assert!("error".parse::<ResponseType>().is_err());
    }

    #[test]
    fn test_response_type_cacheable() {
        assert!(ResponseType::Basic.is_cacheable());
        assert!(ResponseType::Cors.is_cacheable());
        assert!(!ResponseType::Opaque.is_cacheable());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let response = StoredResponse {
            url: "https://example.com/".into(),
            status: 200,
            status_text: "OK".into(),
            response_type: ResponseType::Basic,
            headers: vec![("Content-Type".into(), "text/html".into())],
            body: Vec::new(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        };
        assert_eq!(response.header("content-type"), Some("text/html"));
        assert_eq!(response.header("etag"), None);
    }
}
