//! teamca directory - the team-partitioned store and everything published to it
//!
//! The [`TeamStore`] trait is the only channel teamca uses to publish and
//! discover per-team state. On top of it sit the [`ClientConfigDistributor`]
//! (publish on startup, retract on shutdown) and the [`BoundedScanner`]
//! (concurrency-capped maintenance across every visible team).

pub mod access;
pub mod client_config;
pub mod error;
mod fanout;
pub mod identity;
pub mod logs;
pub mod paths;
pub mod scanner;
pub mod store;

pub use access::verify_team_access;
pub use client_config::{computed_team_set, ClientConfigDistributor, ClientConfigEntry};
pub use error::{DirectoryError, Result};
pub use identity::{AccountIdentity, StaticIdentity};
pub use logs::{remove_log_artifact, LogLocation};
pub use paths::{client_config_path, is_store_path, team_dir, CLIENT_CONFIG_FILENAME, TEAM_ROOT};
pub use scanner::BoundedScanner;
pub use store::{store_from_config, KeybaseCliStore, MemoryStore, MountedStore, TeamStore};
