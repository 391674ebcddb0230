//! URL rules for request interception.

use url::Url;

/// Schemes the proxy intercepts. Everything else (extension pages, `data:`,
/// `blob:`, `about:` ...) goes to the network untouched.
pub const INTERCEPTED_SCHEMES: &[&str] = &["http", "https"];

/// Error type for request URL parsing failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Whether a request URL is eligible for interception.
pub fn is_intercepted_scheme(url: &Url) -> bool {
    INTERCEPTED_SCHEMES.contains(&url.scheme())
}

/// Parse a request URL, resolving relative references against the app origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve against `base` (absolute inputs keep their own scheme and host)
/// 3. Lowercase the host (done by the URL parser)
///
/// The fragment is kept here; it is dropped when the request key is built.
/// Non-http schemes parse fine and are left for the caller to bypass.
pub fn resolve(base: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
