//! Filesystem abstraction for upd.
//!
//! This crate provides a `FileSystem` trait with a native implementation
//! (`std::fs` behind `tokio::task::spawn_blocking`) and an in-memory one used
//! by tests that must not touch the disk.
//!
//! # Example
//!
//! ```no_run
//! use upd_fs::{FileSystem, NativeFileSystem};
//! use std::sync::Arc;
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> std::io::Result<()> {
//! let fs = Arc::new(NativeFileSystem::new(".")?);
//! let manifest = fs.read_to_string(Path::new("package.json")).await?;
//! println!("{}", manifest);
//! # Ok(())
//! # }
//! ```

mod file_system;
pub use file_system::FileSystem;

#[cfg(feature = "native")]
pub mod native;
#[cfg(feature = "native")]
pub use native::NativeFileSystem;

#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "memory")]
pub use memory::MemoryFileSystem;
