//! Team directory store backends
//!
//! Supports the keybase CLI, a locally mounted store and an in-memory store.

mod keybase;
mod memory;
mod mount;

use std::sync::Arc;

use async_trait::async_trait;
use teamca_core::CaConfig;

use crate::error::Result;
use crate::identity::{AccountIdentity, StaticIdentity};

pub use keybase::KeybaseCliStore;
pub use memory::MemoryStore;
pub use mount::MountedStore;

/// Team-partitioned file store.
///
/// Paths are absolute store paths such as `/keybase/team/<team>/<file>`.
#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Name of this backend, for logs
    fn name(&self) -> &str;

    /// Names of the entries directly below `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Check if a file or directory exists
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Read a file
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Write a file, replacing any previous contents
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Delete a file; [`crate::DirectoryError::NotFound`] if it is absent
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Build the store and bot identity described by `config`
pub fn store_from_config(config: &CaConfig) -> (Arc<dyn TeamStore>, Arc<dyn AccountIdentity>) {
    let cli = Arc::new(KeybaseCliStore::with_binary(&config.store.keybase_binary));

    let identity: Arc<dyn AccountIdentity> = match &config.bot_username {
        Some(name) => Arc::new(StaticIdentity(name.clone())),
        None => cli.clone(),
    };

    let store: Arc<dyn TeamStore> = match &config.store.mount {
        Some(mount) => Arc::new(MountedStore::new(mount)),
        None => cli,
    };

    (store, identity)
}
