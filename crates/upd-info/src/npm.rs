//! npm registry client

use crate::client::HttpClient;
use crate::error::{Error, Result};
use crate::npmrc::NpmConfig;
use crate::types::PackageMetadata;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::BTreeMap;
use url::Url;

/// Prefer the abbreviated packument; it is much smaller than the full document
const ACCEPT_PACKUMENT: &str =
    "application/vnd.npm.install-v1+json; q=1.0, application/json; q=0.8, */*";

/// npm registry API response structure (abbreviated or full packument)
#[derive(Debug, Deserialize)]
struct NpmPackageResponse {
    name: String,
    #[serde(rename = "dist-tags", default)]
    dist_tags: BTreeMap<String, String>,
    #[serde(default)]
    versions: BTreeMap<String, IgnoredAny>,
}

/// Build the metadata URL for a package
///
/// Scoped names keep their `@` but encode the separating slash
/// (`@types/node` becomes `@types%2Fnode`).
pub fn package_url(config: &NpmConfig, package_name: &str) -> Result<Url> {
    if package_name.is_empty() {
        return Err(Error::InvalidPackageName(
            "Package name cannot be empty".to_string(),
        ));
    }

    let encoded_name = if package_name.starts_with('@') {
        package_name.replace('/', "%2F")
    } else {
        package_name.to_string()
    };

    Ok(config.registry_for(package_name).join(&encoded_name)?)
}

/// Fetch package metadata from the npm registry
pub async fn fetch_npm_package(
    client: &HttpClient,
    config: &NpmConfig,
    package_name: &str,
) -> Result<PackageMetadata> {
    let url = package_url(config, package_name)?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_PACKUMENT));
    if let Some(token) = config.auth_for(config.registry_for(package_name)) {
        let value = HeaderValue::from_str(&token.header_value())
            .map_err(|e| Error::other(format!("invalid credentials for {}: {}", url, e)))?;
        headers.insert(AUTHORIZATION, value);
    }

    let body = client
        .get_bytes(url.as_str(), headers)
        .await
        .map_err(|e| match e {
            Error::PackageNotFound(_) => Error::PackageNotFound(package_name.to_string()),
            other => other,
        })?;

    parse_packument(&body)
}

/// Decode a packument body into [`PackageMetadata`]
pub fn parse_packument(body: &[u8]) -> Result<PackageMetadata> {
    let response: NpmPackageResponse = serde_json::from_slice(body)?;

    Ok(PackageMetadata {
        name: response.name,
        dist_tags: response.dist_tags,
        versions: response.versions.into_iter().map(|(version, _)| version).collect(),
        bytes: body.len(),
    })
}
