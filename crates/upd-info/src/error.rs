//! Error types for upd-info

use thiserror::Error;

/// Result type alias for upd-info operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for upd-info operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed (connection, TLS, timeout)
    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid package name format
    #[error("invalid package name: {0}")]
    InvalidPackageName(String),

    /// Invalid URL format
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Package not found in registry
    #[error("package \"{0}\" not found")]
    PackageNotFound(String),

    /// Registry answered with an unexpected status
    #[error("HTTP request failed with status {status}: {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Rate limit exceeded (HTTP 429)
    #[error("rate limit exceeded for URL: {0}")]
    RateLimitExceeded(String),

    /// Proxy URL could not be used
    #[error("invalid proxy \"{0}\": {1}")]
    InvalidProxy(String, String),

    /// Reading a configuration file failed
    #[error("cannot read {path}: {source}")]
    Config {
        /// File that failed to load
        path: std::path::PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
