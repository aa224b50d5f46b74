//! Native filesystem implementation using std::fs + tokio.

use crate::FileSystem;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::task;

/// Native filesystem implementation using std::fs + tokio.
///
/// Blocking std::fs calls are wrapped with `tokio::task::spawn_blocking`
/// so they never stall the runtime driving the registry fetches.
#[derive(Debug, Clone)]
pub struct NativeFileSystem {
    project_root: PathBuf,
    canonical_root: PathBuf,
}

impl NativeFileSystem {
    /// Create a new native filesystem scoped to a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the root doesn't exist or can't be canonicalized.
    pub fn new(project_root: impl AsRef<Path>) -> io::Result<Self> {
        let root = project_root.as_ref();
        let project_root = root.canonicalize().or_else(|_| {
            // The root may not exist yet; canonicalize its parent instead
            match (root.parent(), root.file_name()) {
                (Some(parent), Some(name)) => Ok(parent.canonicalize()?.join(name)),
                _ => Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Project root does not exist: {}", root.display()),
                )),
            }
        })?;

        let canonical_root = project_root
            .canonicalize()
            .unwrap_or_else(|_| project_root.clone());

        Ok(Self {
            project_root,
            canonical_root,
        })
    }

    /// Validate that a path is within the project root.
    ///
    /// Relative paths are resolved against the root. Paths that do not exist
    /// yet (temporary files) are validated through their parent directory.
    fn validate_path(&self, path: &Path) -> io::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        let canonical_path = match absolute.canonicalize() {
            Ok(path) => path,
            Err(_) => match (absolute.parent(), absolute.file_name()) {
                (Some(parent), Some(name)) => match parent.canonicalize() {
                    Ok(canonical_parent) => canonical_parent.join(name),
                    Err(_) => normalize_lexically(&absolute),
                },
                _ => absolute.clone(),
            },
        };

        if !canonical_path.starts_with(&self.canonical_root) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "Path traversal detected: {} is outside project root {}",
                    canonical_path.display(),
                    self.project_root.display()
                ),
            ));
        }

        Ok(canonical_path)
    }
}

/// Syntactic normalization for paths whose parent does not exist.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                components.clear();
                components.push(component.as_os_str().to_owned());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if components.len() > 1 {
                    components.pop();
                }
            }
            Component::Normal(name) => components.push(name.to_owned()),
        }
    }
    components.into_iter().collect()
}

#[async_trait::async_trait]
impl FileSystem for NativeFileSystem {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || Ok(validated.exists()))
            .await
            .map_err(io::Error::other)?
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || std::fs::read_to_string(&validated))
            .await
            .map_err(io::Error::other)?
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let validated = self.validate_path(path)?;
        let contents = contents.to_string();
        task::spawn_blocking(move || std::fs::write(&validated, contents))
            .await
            .map_err(io::Error::other)?
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        let validated = self.validate_path(path)?;
        task::spawn_blocking(move || std::fs::remove_file(&validated))
            .await
            .map_err(io::Error::other)?
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from_validated = self.validate_path(from)?;
        let to_validated = self.validate_path(to)?;
        task::spawn_blocking(move || std::fs::rename(&from_validated, &to_validated))
            .await
            .map_err(io::Error::other)?
    }

    async fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
        self.validate_path(path)
    }

    async fn copy_permissions(&self, from: &Path, to: &Path) -> io::Result<()> {
        let from_validated = self.validate_path(from)?;
        let to_validated = self.validate_path(to)?;
        task::spawn_blocking(move || {
            let permissions = std::fs::metadata(&from_validated)?.permissions();
            std::fs::set_permissions(&to_validated, permissions)
        })
        .await
        .map_err(io::Error::other)?
    }

    fn project_root(&self) -> &Path {
        &self.project_root
    }
}
