//! HTTP client wrapper with timeout, proxy, and optional rate limiting

use crate::error::{Error, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::HeaderMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Rate limiter shared by all clones of one client
type RateLimiterHandle = Arc<DefaultDirectRateLimiter>;

/// Settings for [`HttpClient`]
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// `User-Agent` header
    pub user_agent: String,
    /// Timeout applied to every single request
    pub timeout: Duration,
    /// Proxy URL for all schemes
    pub proxy: Option<String>,
    /// Client-side limit in requests per second (`None` or 0 disables it)
    pub requests_per_second: Option<u32>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("upd/{}", env!("CARGO_PKG_VERSION")),
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
            requests_per_second: None,
        }
    }
}

/// HTTP client wrapper for registry requests
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    rate_limiter: Option<RateLimiterHandle>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration (no rate limiting)
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpClientConfig::default())
    }

    /// Create a new HTTP client from explicit settings
    pub fn with_config(config: &HttpClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout);

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| Error::InvalidProxy(proxy.clone(), e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let rate_limiter = config
            .requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));

        Ok(Self {
            client: builder.build()?,
            rate_limiter,
        })
    }

    /// Wait for rate limiter if enabled
    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    /// Make a GET request with custom headers and return the raw body
    ///
    /// A 404 answer is reported as [`Error::PackageNotFound`] carrying the
    /// URL; callers replace it with the package name.
    pub async fn get_bytes(&self, url: &str, headers: HeaderMap) -> Result<Vec<u8>> {
        self.wait_for_rate_limit().await;

        debug!(url, "GET");
        let response = self.client.get(url).headers(headers).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimitExceeded(url.to_string()));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::PackageNotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}
