//! Removal of the CA's log artifact

use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::paths::is_store_path;
use crate::store::TeamStore;

/// Where a log artifact was removed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLocation {
    /// Inside the team directory store
    Store,
    /// On the local filesystem
    Local,
}

/// Delete the log file at `path`, through the store when the path resolves
/// into it and from the local filesystem otherwise
pub async fn remove_log_artifact(store: &dyn TeamStore, path: &Path) -> Result<LogLocation> {
    let location = if is_store_path(path) {
        store.delete(&path.to_string_lossy()).await?;
        LogLocation::Store
    } else {
        tokio::fs::remove_file(path).await?;
        LogLocation::Local
    };

    info!(target: "teamca::audit", path = %path.display(), location = ?location, "removed log file");
    Ok(location)
}
