//! Network boundary of the proxy.
//!
//! ### Contract
//! - A request that produces any HTTP status (2xx, 4xx, 5xx) is `Ok`.
//! - A request that produces no response at all (DNS, refused, TLS, a
//!   transport timeout) is `Err(Error::Network)`.
//! - No retries, no backoff; the transport's own limits apply.
//!
//! ### Response types
//! - Same origin as the app: `basic`
//! - Cross-origin, not `no-cors`, with a matching `Access-Control-Allow-Origin`: `cors`
//! - Any other cross-origin response: `opaque`

pub mod body;
pub mod url;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{self, HeaderName, HeaderValue};
use std::time::{Duration, Instant};

pub use body::Body;
pub use reqwest::header::HeaderMap;
pub use reqwest::{Method, StatusCode, Url};
pub use self::url::{UrlError, is_intercepted_scheme, resolve, same_origin};

use shellcache_core::{Error, ResponseType, StoredResponse};

/// Request mode, as the page would have issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level page navigation; eligible for the offline fallback.
    Navigate,
    SameOrigin,
    #[default]
    Cors,
    NoCors,
}

/// An outgoing request as seen by the proxy.
#[derive(Debug, Clone)]
pub struct NetRequest {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: HeaderMap,
}

impl NetRequest {
    /// A plain GET subresource request.
    pub fn get(url: Url) -> Self {
        Self { method: Method::GET, url, mode: RequestMode::default(), headers: HeaderMap::new() }
    }

    /// A GET page navigation.
    pub fn navigate(url: Url) -> Self {
        Self { mode: RequestMode::Navigate, ..Self::get(url) }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

/// Response from the network or rebuilt from a store.
///
/// Deliberately not `Clone`; see [`NetResponse::tee`].
#[derive(Debug)]
pub struct NetResponse {
    /// The final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: StatusCode,
    pub response_type: ResponseType,
    /// Response headers
    pub headers: HeaderMap,
    body: Body,
}

impl NetResponse {
    pub fn new(url: Url, status: StatusCode, response_type: ResponseType, headers: HeaderMap, body: Body) -> Self {
        Self { url, status, response_type, headers, body }
    }

    /// Rebuild a response from its stored form.
    pub fn from_stored(stored: StoredResponse) -> Result<Self, Error> {
        let url = Url::parse(&stored.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", stored.url)))?;
        let status = StatusCode::from_u16(stored.status).map_err(|e| Error::Serialization(e.to_string()))?;

        let mut headers = HeaderMap::with_capacity(stored.headers.len());
        for (name, value) in &stored.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::Serialization(e.to_string()))?;
            let value = HeaderValue::from_str(value).map_err(|e| Error::Serialization(e.to_string()))?;
            headers.append(name, value);
        }

        Ok(Self { url, status, response_type: stored.response_type, headers, body: Body::new(stored.body) })
    }

    /// Consume the response into its stored form.
    pub fn into_stored(self) -> StoredResponse {
        let headers = self
            .headers
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect();

        StoredResponse {
            url: self.url.to_string(),
            status: self.status.as_u16(),
            status_text: self.status.canonical_reason().unwrap_or_default().to_string(),
            response_type: self.response_type,
            headers,
            body: self.body.into_bytes().to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Duplicate the response so it can be both stored and returned.
    pub fn tee(self) -> (NetResponse, NetResponse) {
        let (left, right) = self.body.tee();
        let copy = NetResponse {
            url: self.url.clone(),
            status: self.status,
            response_type: self.response_type,
            headers: self.headers.clone(),
            body: left,
        };
        (copy, NetResponse { body: right, ..self })
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Consume the response, keeping only its body.
    pub fn into_body(self) -> Body {
        self.body
    }
}

/// Where requests go when the store can't answer them.
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &NetRequest) -> Result<NetResponse, Error>;
}

/// Classify a response relative to the app origin.
pub fn classify(origin: &Url, request: &NetRequest, final_url: &Url, headers: &HeaderMap) -> ResponseType {
    if same_origin(origin, &request.url) && same_origin(origin, final_url) {
        return ResponseType::Basic;
    }
    if request.mode == RequestMode::NoCors {
        return ResponseType::Opaque;
    }

    let allowed = headers
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);
    match allowed {
        Some("*") => ResponseType::Cors,
        Some(value) if value == origin.origin().ascii_serialization() => ResponseType::Cors,
        _ => ResponseType::Opaque,
    }
}

/// Configuration for the HTTP network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Transport timeout; `None` keeps reqwest's default (no timeout).
    pub timeout: Option<Duration>,

    /// Origin the requests are issued on behalf of.
    pub origin: Url,
}

/// reqwest-backed [`Network`].
pub struct HttpNetwork {
    http: Client,
    config: NetworkConfig,
}

impl HttpNetwork {
    /// Create a new network client with the given configuration.
    pub fn new(config: NetworkConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &NetRequest) -> Result<NetResponse, Error> {
        let start = Instant::now();

        let response = self
            .http
            .request(request.method.clone(), request.url.as_str())
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(|e| Error::Network(format!("{}: {e}", request.url)))?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response from {final_url}: {e}")))?;

        let response_type = classify(&self.config.origin, request, &final_url, &headers);
        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            url = %request.url,
            final_url = %final_url,
            status = status.as_u16(),
            response_type = %response_type,
            bytes = bytes.len(),
            fetch_ms,
            "network fetch"
        );

        Ok(NetResponse::new(final_url, status, response_type, headers, Body::new(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn origin() -> Url {
        Url::parse("http://localhost:8080/").unwrap()
    }

    fn network(origin: Url) -> HttpNetwork {
        HttpNetwork::new(NetworkConfig { user_agent: "shellcache-test".into(), timeout: None, origin }).unwrap()
    }

    #[test]
    fn test_classify_same_origin() {
        let request = NetRequest::get(Url::parse("http://localhost:8080/index.html").unwrap());
        let ty = classify(&origin(), &request, &request.url, &HeaderMap::new());
        assert_eq!(ty, ResponseType::Basic);
    }

    #[test]
    fn test_classify_cross_origin_with_wildcard() {
        let request = NetRequest::get(Url::parse("https://cdnjs.cloudflare.com/all.min.css").unwrap());
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        assert_eq!(classify(&origin(), &request, &request.url, &headers), ResponseType::Cors);
    }

    #[test]
    fn test_classify_cross_origin_with_exact_origin() {
        let request = NetRequest::get(Url::parse("https://cdn.example/lib.js").unwrap());
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("http://localhost:8080"));
        assert_eq!(classify(&origin(), &request, &request.url, &headers), ResponseType::Cors);
    }

    #[test]
    fn test_classify_cross_origin_without_cors_header() {
        let request = NetRequest::get(Url::parse("https://i.postimg.cc/a.jpg").unwrap());
        assert_eq!(classify(&origin(), &request, &request.url, &HeaderMap::new()), ResponseType::Opaque);
    }

    #[test]
    fn test_classify_no_cors_mode_is_opaque() {
        let request =
            NetRequest::get(Url::parse("https://cdn.example/lib.js").unwrap()).with_mode(RequestMode::NoCors);
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        assert_eq!(classify(&origin(), &request, &request.url, &headers), ResponseType::Opaque);
    }

    #[test]
    fn test_classify_redirect_off_origin() {
        let request = NetRequest::get(Url::parse("http://localhost:8080/go").unwrap());
        let final_url = Url::parse("https://elsewhere.example/").unwrap();
        assert_eq!(classify(&origin(), &request, &final_url, &HeaderMap::new()), ResponseType::Opaque);
    }

    #[test]
    fn test_stored_round_trip_keeps_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        let response = NetResponse::new(
            origin(),
            StatusCode::OK,
            ResponseType::Basic,
            headers,
            Body::new("<html></html>"),
        );

        let stored = response.into_stored();
        assert_eq!(stored.status_text, "OK");
        assert_eq!(stored.header("content-type"), Some("text/html"));

        let rebuilt = NetResponse::from_stored(stored).unwrap();
        assert_eq!(rebuilt.content_type(), Some("text/html"));
        assert_eq!(rebuilt.into_body().text(), "<html></html>");
    }

    #[test]
    fn test_tee_duplicates_metadata() {
        let response =
            NetResponse::new(origin(), StatusCode::OK, ResponseType::Basic, HeaderMap::new(), Body::new("x"));
        let (a, b) = response.tee();
        assert_eq!(a.url, b.url);
        assert_eq!(a.status, b.status);
        assert_eq!(a.into_body().into_bytes(), b.into_body().into_bytes());
    }

    #[tokio::test]
    async fn test_fetch_same_origin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>shell</html>"))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let request = NetRequest::navigate(base.join("/index.html").unwrap());
        let response = network(base).fetch(&request).await.unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.response_type, ResponseType::Basic);
        assert_eq!(response.into_body().text(), "<html>shell</html>");
    }

    #[tokio::test]
    async fn test_fetch_cross_origin_cors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/all.min.css"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("access-control-allow-origin", "*")
                    .set_body_string("body{}"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap().join("/all.min.css").unwrap();
        let response = network(origin()).fetch(&NetRequest::get(url)).await.unwrap();
        assert_eq!(response.response_type, ResponseType::Cors);
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let response = network(base.clone()).fetch(&NetRequest::get(base.join("/missing").unwrap())).await.unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let result = network(origin()).fetch(&NetRequest::get(url)).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }
}
