//! In-memory store, used for tests and dry runs

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::TeamStore;
use crate::error::{DirectoryError, Result};
use crate::paths::team_dir;

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

/// Store that keeps everything in a map keyed by path
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

fn normalize(path: &str) -> String {
    path.trim_end_matches('/').to_string()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store in which the CA account can see `teams`
    pub fn with_teams<I, S>(teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inner = Inner::default();
        for team in teams {
            inner.dirs.insert(team_dir(team.as_ref()));
        }
        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Every stored file path
    pub async fn paths(&self) -> Vec<String> {
        self.inner.read().await.files.keys().cloned().collect()
    }
}

#[async_trait]
impl TeamStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", normalize(prefix));
        let inner = self.inner.read().await;

        let children: BTreeSet<String> = inner
            .dirs
            .iter()
            .chain(inner.files.keys())
            .filter_map(|p| p.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Ok(children.into_iter().collect())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let path = normalize(path);
        let inner = self.inner.read().await;
        let dir_prefix = format!("{}/", path);
        Ok(inner.files.contains_key(&path)
            || inner.dirs.contains(&path)
            || inner.files.keys().any(|p| p.starts_with(&dir_prefix)))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = normalize(path);
        self.inner
            .read()
            .await
            .files
            .get(&path)
            .cloned()
            .ok_or(DirectoryError::NotFound(path))
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.inner
            .write()
            .await
            .files
            .insert(normalize(path), data.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        match self.inner.write().await.files.remove(&path) {
            Some(_) => Ok(()),
            None => Err(DirectoryError::NotFound(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{client_config_path, TEAM_ROOT};

    #[tokio::test]
    async fn test_list_teams() {
        let store = MemoryStore::with_teams(["alpha", "beta"]);
        store
            .write(&client_config_path("gamma"), b"{}")
            .await
            .unwrap();

        let teams = store.list(TEAM_ROOT).await.unwrap();
        assert_eq!(teams, vec!["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn test_file_lifecycle() {
        let store = MemoryStore::with_teams(["alpha"]);
        let path = client_config_path("alpha");

        assert!(store.exists("/keybase/team/alpha").await.unwrap());
        assert!(!store.exists(&path).await.unwrap());

        store.write(&path, b"one").await.unwrap();
        store.write(&path, b"two").await.unwrap();
        assert_eq!(store.read(&path).await.unwrap(), b"two");

        store.delete(&path).await.unwrap();
        assert!(!store.exists(&path).await.unwrap());
        assert!(store.delete(&path).await.unwrap_err().is_not_found());
        assert!(store.read(&path).await.unwrap_err().is_not_found());
    }
}
