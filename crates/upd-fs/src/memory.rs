//! In-memory filesystem implementation.

use crate::FileSystem;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// In-memory filesystem keyed by normalized absolute paths.
///
/// Used by tests that exercise the full read, upgrade, write cycle without
/// touching the disk. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    project_root: PathBuf,
    files: Arc<RwLock<HashMap<PathBuf, String>>>,
}

impl MemoryFileSystem {
    /// Create an empty filesystem rooted at `project_root` (e.g. "/project").
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let project_root = normalize(project_root.as_ref())?;
        Ok(Self {
            project_root,
            files: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Add a file (used during test setup).
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<String>) -> io::Result<()> {
        let normalized = self.validate_path(path.as_ref())?;
        self.files.write().insert(normalized, contents.into());
        Ok(())
    }

    /// Snapshot of a file's contents, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let normalized = self.validate_path(path.as_ref()).ok()?;
        self.files.read().get(&normalized).cloned()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Whether no files are stored.
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    fn validate_path(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };
        let normalized = normalize(&absolute)?;

        if !normalized.starts_with(&self.project_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "Path traversal detected: {} is outside {}",
                    normalized.display(),
                    self.project_root.display()
                ),
            ));
        }

        Ok(normalized)
    }
}

/// Lexical normalization; `..` may not climb above the first component.
fn normalize(path: &Path) -> io::Result<PathBuf> {
    let mut components = Vec::new();
    let mut is_absolute = false;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                is_absolute = true;
                components.clear();
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if components.pop().is_none() {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "Path attempts to escape root using ..",
                    ));
                }
            }
            Component::Normal(name) => components.push(name),
        }
    }

    let mut result = PathBuf::new();
    if is_absolute {
        result.push("/");
    }
    result.extend(components);
    Ok(result)
}

#[async_trait::async_trait]
impl FileSystem for MemoryFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let normalized = self.validate_path(path)?;
        Ok(self.files.read().contains_key(&normalized))
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let normalized = self.validate_path(path)?;
        self.files.read().get(&normalized).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {}", normalized.display()),
            )
        })
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let normalized = self.validate_path(path)?;
        self.files.write().insert(normalized, contents.to_string());
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        let normalized = self.validate_path(path)?;
        self.files
            .write()
            .remove(&normalized)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "File not found"))
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from_normalized = self.validate_path(from)?;
        let to_normalized = self.validate_path(to)?;

        let mut files = self.files.write();
        let contents = files
            .remove(&from_normalized)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Source file not found"))?;
        files.insert(to_normalized, contents);
        Ok(())
    }

    async fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        self.validate_path(path)
    }

    /// Files in memory carry no permissions
    async fn copy_permissions(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from_normalized = self.validate_path(from)?;
        let to_normalized = self.validate_path(to)?;
        let files = self.files.read();
        if files.contains_key(&from_normalized) && files.contains_key(&to_normalized) {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, "File not found"))
        }
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}
