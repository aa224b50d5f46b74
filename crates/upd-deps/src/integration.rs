//! Integration with upd-info for fetching remote package data

use crate::traits::PackageRegistry;
use upd_info::{PackageMetadata, RegistryClient};

#[async_trait::async_trait]
impl PackageRegistry for RegistryClient {
    async fn fetch_package(&self, name: &str) -> upd_info::Result<PackageMetadata> {
        self.fetch_npm(name).await
    }
}
