//! npm registry metadata fetcher
//!
//! This library fetches the dist-tags and published versions of npm
//! packages, honouring the registry, credential, and proxy settings of
//! `.npmrc` files.
//!
//! # Example
//!
//! ```no_run
//! use upd_info::RegistryClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RegistryClient::new()?;
//!
//!     let react = client.fetch_npm("react").await?;
//!     println!("react latest: {:?}", react.latest());
//!     println!("{} versions published", react.versions.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod npm;
mod npmrc;
mod types;

pub use client::{HttpClient, HttpClientConfig, DEFAULT_TIMEOUT};
pub use error::{Error, Result};
pub use npm::{package_url, parse_packument};
pub use npmrc::{NpmConfig, DEFAULT_REGISTRY};
pub use types::{AuthToken, PackageMetadata};

/// Main client for fetching package metadata
///
/// Combines an [`HttpClient`] (timeout, proxy, optional rate limit) with the
/// effective [`NpmConfig`] used to pick registries and credentials.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: HttpClient,
    config: NpmConfig,
}

impl RegistryClient {
    /// Create a client for the public registry with default HTTP settings
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: HttpClient::new()?,
            config: NpmConfig::default(),
        })
    }

    /// Create a client from explicit HTTP settings and npm configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized (for
    /// example an unusable proxy URL).
    pub fn with_config(http: &HttpClientConfig, config: NpmConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::with_config(http)?,
            config,
        })
    }

    /// The npm configuration in effect
    pub fn config(&self) -> &NpmConfig {
        &self.config
    }

    /// Fetch package metadata from the registry serving `name`
    ///
    /// # Arguments
    ///
    /// * `name` - Package name (e.g., "react" or "@types/node")
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use upd_info::RegistryClient;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = RegistryClient::new()?;
    /// let info = client.fetch_npm("@types/node").await?;
    /// println!("{:?}", info.latest());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch_npm(&self, name: &str) -> Result<PackageMetadata> {
        npm::fetch_npm_package(&self.http, &self.config, name).await
    }
}
