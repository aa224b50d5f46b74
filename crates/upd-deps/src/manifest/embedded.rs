//! Arguments embedded in the manifest's `upd` field

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

/// Name of the manifest field holding embedded arguments
pub const EMBEDDED_FIELD: &str = "upd";

/// Contents of the `upd` field
///
/// ```json
/// { "upd": "!typescript !@types/*" }
/// { "upd": ["!typescript", "!@types/*"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EmbeddedArgs {
    /// Whitespace separated arguments
    Single(String),
    /// One argument per element
    Many(Vec<String>),
}

impl EmbeddedArgs {
    /// Read the `upd` field of a manifest, if present
    ///
    /// # Errors
    /// Returns [`Error::InvalidEmbeddedArgs`] if the field is neither a string
    /// nor an array of strings
    pub fn from_manifest(manifest: &Value) -> Result<Option<Self>> {
        let Some(field) = manifest.get(EMBEDDED_FIELD) else {
            return Ok(None);
        };
        EmbeddedArgs::deserialize(field)
            .map(Some)
            .map_err(|_| Error::InvalidEmbeddedArgs(field.to_string()))
    }

    /// Individual arguments
    pub fn into_args(self) -> Vec<String> {
        match self {
            EmbeddedArgs::Single(line) => line.split_whitespace().map(str::to_string).collect(),
            EmbeddedArgs::Many(args) => args,
        }
    }
}
