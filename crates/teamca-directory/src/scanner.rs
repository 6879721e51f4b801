//! Bounded maintenance scanner
//!
//! Fans a check-then-delete over every team the CA account can see, with
//! at most `limit` store operations in flight at any time.

use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::paths::{client_config_path, TEAM_ROOT};
use crate::store::TeamStore;

/// Concurrency-capped sweep across every visible team
pub struct BoundedScanner {
    store: Arc<dyn TeamStore>,
    slots: Arc<Semaphore>,
    limit: usize,
}

impl BoundedScanner {
    /// `limit` is fixed for the scanner's lifetime
    pub fn new(store: Arc<dyn TeamStore>, limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            store,
            slots: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Delete the client config file of every visible team that has one.
    ///
    /// Returns the teams whose file was deleted, in completion order.
    /// Per-team failures are logged and skipped.
    pub async fn wipe_client_configs(&self) -> Result<Vec<String>> {
        let teams = self.store.list(TEAM_ROOT).await?;
        info!(teams = teams.len(), limit = self.limit, "scanning teams for client configs");

        let deleted = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::with_capacity(teams.len());

        for team in teams {
            let store = self.store.clone();
            let slots = self.slots.clone();
            let deleted = deleted.clone();

            let handle = tokio::spawn(async move {
                let permit = match slots.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                let result = remove_if_present(&*store, &team).await;
                drop(permit);

                match result {
                    Ok(true) => deleted.lock().await.push(team),
                    Ok(false) => debug!(team = %team, "no client config"),
                    Err(e) => warn!(team = %team, error = %e, "failed to wipe client config"),
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "scan task panicked");
            }
        }

        let deleted = std::mem::take(&mut *deleted.lock().await);
        info!(target: "teamca::audit", teams = ?deleted, "wiped client configs");
        Ok(deleted)
    }
}

/// `Ok(true)` when a file existed and was deleted
async fn remove_if_present(store: &dyn TeamStore, team: &str) -> Result<bool> {
    let path = client_config_path(team);
    if !store.exists(&path).await? {
        return Ok(false);
    }
    store.delete(&path).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectoryError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts concurrent operations and records the peak
    struct InstrumentedStore {
        inner: MemoryStore,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        fail_team: Option<&'static str>,
    }

    impl InstrumentedStore {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                fail_team: None,
            }
        }

        async fn tracked<T>(&self, op: impl std::future::Future<Output = T>) -> T {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            let out = op.await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            out
        }
    }

    #[async_trait]
    impl TeamStore for InstrumentedStore {
        fn name(&self) -> &str {
            "instrumented"
        }
        async fn list(&self, prefix: &str) -> Result<Vec<String>> {
            self.inner.list(prefix).await
        }
        async fn exists(&self, path: &str) -> Result<bool> {
            self.tracked(self.inner.exists(path)).await
        }
        async fn read(&self, path: &str) -> Result<Vec<u8>> {
            self.tracked(self.inner.read(path)).await
        }
        async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
            self.inner.write(path, data).await
        }
        async fn delete(&self, path: &str) -> Result<()> {
            if self.fail_team.is_some_and(|t| path == client_config_path(t)) {
                return Err(DirectoryError::Io(std::io::Error::other("store unavailable")));
            }
            self.tracked(self.inner.delete(path)).await
        }
    }

    #[tokio::test]
    async fn test_wipe_deletes_only_stray_configs() {
        let store = Arc::new(MemoryStore::with_teams(["alpha", "beta", "gamma"]));
        store
            .write(&client_config_path("beta"), b"{}")
            .await
            .unwrap();

        let deleted = BoundedScanner::new(store.clone(), 10)
            .wipe_client_configs()
            .await
            .unwrap();

        assert_eq!(deleted, vec!["beta"]);
        assert!(store.paths().await.is_empty());
        assert!(store.exists("/keybase/team/alpha").await.unwrap());
    }

    #[tokio::test]
    async fn test_wipe_with_no_teams() {
        let store = Arc::new(MemoryStore::new());
        let deleted = BoundedScanner::new(store, 3)
            .wipe_client_configs()
            .await
            .unwrap();
        assert!(deleted.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_wipe_never_exceeds_limit() {
        let teams: Vec<String> = (0..60).map(|i| format!("team{:02}", i)).collect();
        let memory = MemoryStore::with_teams(&teams);
        for team in teams.iter().step_by(2) {
            memory.write(&client_config_path(team), b"{}").await.unwrap();
        }
        let store = Arc::new(InstrumentedStore::new(memory));

        let mut deleted = BoundedScanner::new(store.clone(), 4)
            .wipe_client_configs()
            .await
            .unwrap();

        let peak = store.peak.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak in-flight was {}", peak);
        assert!(peak >= 1);

        deleted.sort();
        let expected: Vec<String> = teams.iter().step_by(2).cloned().collect();
        assert_eq!(deleted, expected);
        assert!(store.inner.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_wipe_continues_past_failures() {
        let memory = MemoryStore::with_teams(["alpha", "beta", "gamma"]);
        for team in ["alpha", "beta", "gamma"] {
            memory.write(&client_config_path(team), b"{}").await.unwrap();
        }
        let mut store = InstrumentedStore::new(memory);
        store.fail_team = Some("beta");
        let store = Arc::new(store);

        let mut deleted = BoundedScanner::new(store.clone(), 2)
            .wipe_client_configs()
            .await
            .unwrap();
        deleted.sort();

        assert_eq!(deleted, vec!["alpha", "gamma"]);
        assert_eq!(store.inner.paths().await, vec![client_config_path("beta")]);
    }

    #[test]
    fn test_limit_is_at_least_one() {
        let scanner = BoundedScanner::new(Arc::new(MemoryStore::new()), 0);
        assert_eq!(scanner.limit(), 1);
    }
}
