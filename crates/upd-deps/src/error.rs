//! Error types for upd-deps

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using upd-deps Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in upd-deps
///
/// Registry failures and policy failures for a single package are recorded
/// on the affected entries instead of being returned; every other variant
/// aborts the run before anything is written.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed manifest document
    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        /// 1-based line of the offending character
        line: usize,
        /// 1-based column of the offending character
        column: usize,
        /// Description of the syntax error
        message: String,
    },

    /// The embedded `upd` field has an unsupported shape
    #[error("invalid field \"upd\" in manifest (expected string or array of strings): {0}")]
    InvalidEmbeddedArgs(String),

    /// Manifest file not found
    #[error("cannot find package manifest under path \"{0}\"")]
    FileNotFound(PathBuf),

    /// A container node was used where a leaf was required
    #[error("cannot set a value on a {0} node")]
    NotALeaf(&'static str),

    /// A node path does not address a node of the document
    #[error("no node at path {0}")]
    InvalidNodePath(String),

    /// Structural query could not be compiled
    #[error("query syntax error at offset {position}: {message}")]
    QuerySyntax {
        /// Byte offset inside the query text
        position: usize,
        /// Description of the problem
        message: String,
    },

    /// Query references a placeholder that was not bound
    #[error("query placeholder {{{0}}} is not bound")]
    UnboundPlaceholder(String),

    /// A query expected to find exactly one node found zero or several
    #[error("expected exactly one node for {bindings}, found {matches}")]
    QueryCardinality {
        /// The bindings the query was executed with
        bindings: String,
        /// Number of matching nodes
        matches: usize,
    },

    /// Registry metadata lacks what the selection policy needs
    #[error("no usable version for module \"{package}\": {reason}")]
    Policy {
        /// Package name
        package: String,
        /// What was missing or invalid
        reason: String,
    },

    /// Invalid version string
    #[error("invalid version '{0}': {1}")]
    InvalidVersion(String, String),

    /// Rewriting the specifier did not change it
    #[error(
        "failed to update module \"{package}\" version string \"{specifier}\" \
         from \"{old_version}\" to \"{new_version}\" in manifest"
    )]
    PatchConsistency {
        /// Package name
        package: String,
        /// Original specifier
        specifier: String,
        /// Version expected inside the specifier
        old_version: String,
        /// Replacement version
        new_version: String,
    },

    /// Invalid inclusion pattern
    #[error("invalid pattern '{0}': {1}")]
    InvalidPattern(String, String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}
