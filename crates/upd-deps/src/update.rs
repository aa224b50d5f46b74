//! Safe file update operations

use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use upd_fs::FileSystem;

/// File updater that performs atomic writes
pub struct FileUpdater {
    dry_run: bool,
}

impl FileUpdater {
    /// Create a new file updater
    ///
    /// # Arguments
    /// * `dry_run` - If true, don't actually write changes
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Atomically replace a file's contents
    ///
    /// Strategy:
    /// 1. Resolve symlinks so the link itself survives the rewrite
    /// 2. Write to a temporary sibling of the resolved file
    /// 3. Verify the contents read back unchanged
    /// 4. Copy the file's permissions onto the temporary file
    /// 5. Rename over the target (atomic on POSIX, best-effort on Windows)
    ///
    /// The temporary file is removed again if any step fails.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written or renamed
    pub async fn update_file<F: FileSystem>(
        &self,
        fs: &Arc<F>,
        path: &Path,
        new_contents: &str,
    ) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }

        let target = fs.resolve(path).await?;
        let temp_path = temp_path_for(&target);
        let result: Result<()> = async {
            fs.write(&temp_path, new_contents).await?;

            let written = fs.read_to_string(&temp_path).await?;
            if written != new_contents {
                return Err(crate::Error::Other(format!(
                    "contents of {} changed while writing",
                    temp_path.display()
                )));
            }

            if fs.exists(&target).await? {
                fs.copy_permissions(&target, &temp_path).await?;
            }
            fs.rename(&temp_path, &target).await?;
            Ok(())
        }
        .await;

        if result.is_err() && fs.exists(&temp_path).await.unwrap_or(false) {
            if let Err(e) = fs.remove_file(&temp_path).await {
                warn!(path = %temp_path.display(), error = %e, "failed to remove temporary file");
            }
        }
        result
    }
}

/// `package.json` becomes `package.json.tmp`
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use upd_fs::{MemoryFileSystem, NativeFileSystem};

    #[tokio::test]
    async fn test_update_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("package.json");
        let fs = Arc::new(NativeFileSystem::new(temp_dir.path()).unwrap());

        std::fs::write(&file_path, "old content").unwrap();

        let updater = FileUpdater::new(false);
        updater
            .update_file(&fs, &file_path, "new content")
            .await
            .unwrap();

        let content = std::fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "new content");
        assert!(!temp_dir.path().join("package.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("package.json");
        let fs = Arc::new(NativeFileSystem::new(temp_dir.path()).unwrap());

        std::fs::write(&file_path, "old content").unwrap();

        let updater = FileUpdater::new(true);
        updater
            .update_file(&fs, &file_path, "new content")
            .await
            .unwrap();

        let content = std::fs::read_to_string(&file_path).unwrap();
        assert_eq!(content, "old content");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_update_keeps_symlink_and_mode() {
        use std::os::unix::fs::{symlink, PermissionsExt};

        let temp_dir = TempDir::new().unwrap();
        let real_dir = temp_dir.path().join("shared");
        std::fs::create_dir(&real_dir).unwrap();
        let real_file = real_dir.join("package.json");
        std::fs::write(&real_file, "old content").unwrap();
        std::fs::set_permissions(&real_file, std::fs::Permissions::from_mode(0o640)).unwrap();

        let link = temp_dir.path().join("package.json");
        symlink(&real_file, &link).unwrap();
        let fs = Arc::new(NativeFileSystem::new(temp_dir.path()).unwrap());

        FileUpdater::new(false)
            .update_file(&fs, &link, "new content")
            .await
            .unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&real_file).unwrap(), "new content");
        let mode = std::fs::metadata(&real_file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
        assert!(!real_dir.join("package.json.tmp").exists());
        assert!(!temp_dir.path().join("package.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_update_in_memory() {
        let fs = Arc::new(MemoryFileSystem::new("/project").unwrap());
        fs.add_file("/project/package.json", "{}").unwrap();

        FileUpdater::new(false)
            .update_file(&fs, Path::new("/project/package.json"), "{ }")
            .await
            .unwrap();

        assert_eq!(fs.contents("/project/package.json").as_deref(), Some("{ }"));
        assert_eq!(fs.len(), 1);
    }

    #[test]
    fn test_temp_path_keeps_full_name() {
        assert_eq!(
            temp_path_for(Path::new("/p/package.json")),
            PathBuf::from("/p/package.json.tmp")
        );
        assert_eq!(temp_path_for(Path::new("manifest")), PathBuf::from("manifest.tmp"));
    }
}
