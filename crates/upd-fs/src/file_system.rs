//! FileSystem trait for reading and rewriting manifests.

use std::io;
use std::path::{Path, PathBuf};

/// Filesystem operations needed to read a manifest and write it back.
///
/// All methods are async so the native implementation can push blocking
/// `std::fs` calls onto tokio's blocking pool while the in-memory
/// implementation completes immediately.
///
/// Errors are plain `std::io::Error` values; implementations map their own
/// failures onto the matching `io::ErrorKind`.
#[async_trait::async_trait]
pub trait FileSystem: Send + Sync {
    /// Check if a path exists.
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Read file contents as a string.
    ///
    /// # Errors
    ///
    /// Returns `io::ErrorKind::NotFound` if file doesn't exist.
    /// Returns `io::ErrorKind::InvalidData` if file is not valid UTF-8.
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string contents to a file, replacing it.
    ///
    /// Parent directories are NOT created automatically.
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Remove a file.
    async fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Atomically rename a file.
    ///
    /// Used for atomic file updates (write to .tmp, then rename).
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Absolute path of the file `path` refers to, symlinks followed.
    ///
    /// Rewrites go to the resolved path so a symlinked manifest stays a link.
    async fn resolve(&self, path: &Path) -> io::Result<PathBuf>;

    /// Give `to` the permissions of `from`.
    async fn copy_permissions(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Get the root this filesystem is scoped to.
    ///
    /// All operations are validated against this root.
    fn project_root(&self) -> &Path;
}
