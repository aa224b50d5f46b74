//! # upd-deps
//!
//! Format-preserving upgrades of npm `package.json` dependencies.
//!
//! This crate provides functionality to:
//! - Parse manifests into a lossless document tree (comments included)
//! - Locate nodes with structural queries
//! - Scan dependency sections and filter names by glob patterns
//! - Resolve packages against a registry with bounded concurrency
//! - Choose target versions (`latest` tag or greatest published version)
//! - Rewrite version specifiers in place and write the manifest atomically
//!
//! ## Architecture
//!
//! - [`document`] and [`query`] form the editing layer; nothing else in a
//!   manifest changes when a specifier is rewritten
//! - [`PackageRegistry`] is the seam to `upd-info`; tests plug in
//!   in-memory registries
//! - [`Upgrader`] runs the whole parse → scan → resolve → patch → persist
//!   sequence
//!
//! ## Example
//!
//! ```rust,no_run
//! use upd_deps::{NoProgress, UpgradeOptions, Upgrader};
//! use upd_fs::NativeFileSystem;
//! use upd_info::RegistryClient;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fs = Arc::new(NativeFileSystem::new(".")?);
//! let options = UpgradeOptions {
//!     dry_run: true,
//!     ..UpgradeOptions::default()
//! };
//! let upgrader = Upgrader::new(RegistryClient::new()?, options)?;
//!
//! let report = upgrader
//!     .upgrade_file(&fs, Path::new("package.json"), &mut NoProgress)
//!     .await?;
//! for row in &report.rows {
//!     println!("{}: {} -> {} ({})", row.name, row.old_specifier, row.new_specifier, row.state);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod integration;
pub mod manifest;
pub mod patch;
pub mod pipeline;
pub mod query;
pub mod traits;
pub mod types;
pub mod update;
pub mod upgrade;
pub mod version;

// Re-export main types and traits
pub use error::{Error, Result};
pub use traits::{NoProgress, PackageRegistry, ProgressSink};
pub use types::{
    DependencyEntry, DependencySection, DependencyState, ProgressEvent, ResolutionResult, Row,
};

// Re-export the editing layer
pub use document::{Document, Node, NodeKind, NodePath, Scalar};
pub use query::{Bindings, Query};

// Re-export the upgrade pipeline
pub use manifest::{DependencyCatalog, EmbeddedArgs, PatternFilter};
pub use patch::{rewrite_specifier, PatchApplier, SPECIFIER_QUERY};
pub use pipeline::{ResolutionPipeline, DEFAULT_CONCURRENCY};
pub use update::FileUpdater;
pub use upgrade::{UpgradeOptions, UpgradeReport, Upgrader};
pub use version::{compare_versions, decide, select_version, SelectionMode};
