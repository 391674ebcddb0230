//! Unified error types for shellcache.
//!
//! Every variant renders with an upper-case code prefix so tool callers can
//! match on it without parsing free text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error type shared by the store, the network boundary and the proxy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty store name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// URL could not be parsed or resolved.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// The request never produced a response (DNS, refused, TLS, offline).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// A response arrived but its status is not acceptable for the operation.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// No store exists under the given name.
    #[error("STORE_NOT_FOUND: {0}")]
    StoreNotFound(String),

    /// A strict install hit at least one failing pre-cache URL.
    #[error("INSTALL_FAILED: {0}")]
    InstallFailed(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored data could not be encoded or decoded.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(String),

    /// A background task panicked or was cancelled before it finished.
    #[error("INTERNAL_ERROR: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            Error::Internal(format!("task cancelled: {err}"))
        } else {
            Error::Internal(format!("task failed: {err}"))
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::StoreNotFound(msg) => (-32001, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::Network(msg) => (-32006, msg.clone()),
            Error::HttpError(msg) => (-32008, msg.clone()),
            Error::InstallFailed(msg) => (-32013, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::Serialization(msg) => (-32002, msg.clone()),
            Error::Internal(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::StoreNotFound("so-v3".to_string());
        assert!(err.to_string().contains("STORE_NOT_FOUND"));
        assert!(err.to_string().contains("so-v3"));
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::Network("connection refused".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32006);
        assert_eq!(mcp_err.message, "connection refused");
    }

    #[tokio::test]
    async fn test_join_error_from_panic() {
        let join_err = tokio::spawn(async { panic!("boom") }).await.unwrap_err();
        let err: Error = join_err.into();
        assert!(err.to_string().starts_with("INTERNAL_ERROR: task failed"));

        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32603);
    }

    #[tokio::test]
    async fn test_join_error_from_cancellation() {
        let handle = tokio::spawn(std::future::pending::<()>());
        handle.abort();
        let err: Error = handle.await.unwrap_err().into();
        assert!(err.to_string().starts_with("INTERNAL_ERROR: task cancelled"));
    }

    #[test]
    fn test_serde_json_error_is_cache_error() {
        let err: Error = serde_json::from_str::<Vec<String>>("not json").unwrap_err().into();
        assert!(err.to_string().starts_with("CACHE_ERROR"));
    }
}
