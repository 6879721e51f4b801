//! Well-known locations inside the team directory store

use std::path::Path;

/// Root of the store; every path teamca touches lives below it
pub const STORE_ROOT: &str = "/keybase/";

/// Parent of every team namespace
pub const TEAM_ROOT: &str = "/keybase/team/";

/// Reserved client config file inside each team namespace
pub const CLIENT_CONFIG_FILENAME: &str = "kssh-client.config";

/// Namespace of `team`
pub fn team_dir(team: &str) -> String {
    format!("{}{}", TEAM_ROOT, team)
}

/// Client config location for `team`
pub fn client_config_path(team: &str) -> String {
    format!("{}{}/{}", TEAM_ROOT, team, CLIENT_CONFIG_FILENAME)
}

/// Whether `path` resolves into the store rather than the local filesystem
pub fn is_store_path(path: &Path) -> bool {
    path.to_string_lossy().starts_with(STORE_ROOT)
}
