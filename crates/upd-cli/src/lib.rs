//! upd CLI library components.
//!
//! This crate provides the command-line interface for upgrading the
//! dependencies of an npm `package.json`. The main binary is in `main.rs`.

// Module declarations
pub mod cli;
pub mod display;
pub mod logging;
pub mod proxy;

// Re-export the report types the renderers consume
pub use upd_deps::{DependencyState, Row, UpgradeReport};
