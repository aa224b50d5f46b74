//! Core domain types for registry metadata

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Package metadata from the npm registry
///
/// Decoded from the abbreviated packument
/// (`application/vnd.npm.install-v1+json`), which only carries what version
/// selection needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Package name as reported by the registry
    pub name: String,
    /// Distribution tags (e.g. `latest`, `next`)
    pub dist_tags: BTreeMap<String, String>,
    /// All published versions, in lexical order
    pub versions: Vec<String>,
    /// Size of the response body in bytes
    pub bytes: usize,
}

impl PackageMetadata {
    /// Create metadata without a byte count (fixtures, fakes)
    pub fn new(
        name: impl Into<String>,
        dist_tags: impl IntoIterator<Item = (String, String)>,
        versions: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            name: name.into(),
            dist_tags: dist_tags.into_iter().collect(),
            versions: versions.into_iter().collect(),
            bytes: 0,
        }
    }

    /// The version the `latest` distribution tag points at
    pub fn latest(&self) -> Option<&str> {
        self.dist_tags.get("latest").map(String::as_str)
    }
}

/// Credentials attached to registry requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthToken {
    /// `_authToken` entries
    Bearer(String),
    /// `_auth` entries (already base64 encoded `user:password`)
    Basic(String),
}

impl AuthToken {
    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        match self {
            AuthToken::Bearer(token) => format!("Bearer {}", token),
            AuthToken::Basic(token) => format!("Basic {}", token),
        }
    }
}
