//! Store accessed through its local mount point

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::TeamStore;
use crate::error::{DirectoryError, Result};
use crate::paths::STORE_ROOT;

/// Maps `/keybase/...` store paths onto a mounted directory
pub struct MountedStore {
    mount: PathBuf,
}

impl MountedStore {
    pub fn new(mount: impl Into<PathBuf>) -> Self {
        Self {
            mount: mount.into(),
        }
    }

    /// Local file behind a `/keybase/...` store path
    pub fn local_path(&self, path: &str) -> Result<PathBuf> {
        let root = STORE_ROOT.trim_end_matches('/');
        let relative = path
            .strip_prefix(root)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .ok_or_else(|| DirectoryError::InvalidPath(path.to_string()))?;
        let relative = relative.trim_start_matches('/');

        if Path::new(relative)
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(DirectoryError::InvalidPath(path.to_string()));
        }
        Ok(self.mount.join(relative))
    }

    fn map_not_found(path: &str, e: std::io::Error) -> DirectoryError {
        if e.kind() == std::io::ErrorKind::NotFound {
            DirectoryError::NotFound(path.to_string())
        } else {
            DirectoryError::Io(e)
        }
    }
}

#[async_trait]
impl TeamStore for MountedStore {
    fn name(&self) -> &str {
        "mounted"
    }

    #[instrument(skip(self))]
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = self.local_path(prefix)?;
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| Self::map_not_found(prefix, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        debug!(count = names.len(), "listed entries");
        Ok(names)
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.local_path(path)?).await?)
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(self.local_path(path)?)
            .await
            .map_err(|e| Self::map_not_found(path, e))
    }

    #[instrument(skip(self, data), fields(bytes = data.len()))]
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        tokio::fs::write(self.local_path(path)?, data)
            .await
            .map_err(|e| Self::map_not_found(path, e))
    }

    #[instrument(skip(self))]
    async fn delete(&self, path: &str) -> Result<()> {
        tokio::fs::remove_file(self.local_path(path)?)
            .await
            .map_err(|e| Self::map_not_found(path, e))
    }
}
