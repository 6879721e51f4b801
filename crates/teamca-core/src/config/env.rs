//! Environment variable overrides

use std::path::PathBuf;

use tracing::debug;

use super::types::CaConfig;
use crate::error::{ConfigError, Result};

pub const CA_KEY_LOCATION: &str = "CA_KEY_LOCATION";
pub const TEAMS: &str = "TEAMS";
pub const CHAT_CHANNEL: &str = "CHAT_CHANNEL";
pub const KEY_EXPIRATION: &str = "KEY_EXPIRATION";
pub const LOG_LOCATION: &str = "LOG_LOCATION";
pub const BOT_USERNAME: &str = "BOT_USERNAME";
pub const KEYBASE_BINARY: &str = "KEYBASE_BINARY";
pub const KBFS_MOUNT: &str = "KBFS_MOUNT";
pub const MAINTENANCE_CONCURRENCY: &str = "MAINTENANCE_CONCURRENCY";
pub const DISTRIBUTION_CONCURRENCY: &str = "DISTRIBUTION_CONCURRENCY";
pub const CLEANUP_TIMEOUT_SECS: &str = "CLEANUP_TIMEOUT_SECS";

/// Forces `generate` to replace an existing CA key
pub const FORCE_WRITE: &str = "FORCE_WRITE";

/// Interpret an environment-style boolean (`true`, `1`, `yes`)
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// Read a boolean flag from the process environment
pub fn flag_enabled(name: &str) -> bool {
    std::env::var(name).map(|v| parse_bool(&v)).unwrap_or(false)
}

/// Overlay environment values onto `config`.
///
/// `lookup` abstracts the environment so tests can feed values directly.
/// Empty values count as unset.
pub fn apply_env_overrides<F>(config: &mut CaConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(CA_KEY_LOCATION) {
        config.ca_key_location = PathBuf::from(v);
    }
    if let Some(v) = get(TEAMS) {
        config.teams = v
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }
    if let Some(v) = get(CHAT_CHANNEL) {
        config.chat_channel = Some(v.parse()?);
    }
    if let Some(v) = get(KEY_EXPIRATION) {
        config.key_expiration = v.parse()?;
    }
    if let Some(v) = get(LOG_LOCATION) {
        config.log_location = Some(PathBuf::from(v));
    }
    if let Some(v) = get(BOT_USERNAME) {
        config.bot_username = Some(v.trim().to_string());
    }
    if let Some(v) = get(KEYBASE_BINARY) {
        config.store.keybase_binary = v;
    }
    if let Some(v) = get(KBFS_MOUNT) {
        config.store.mount = Some(PathBuf::from(v));
    }
    if let Some(v) = get(MAINTENANCE_CONCURRENCY) {
        config.concurrency.maintenance = parse_number(MAINTENANCE_CONCURRENCY, &v)?;
    }
    if let Some(v) = get(DISTRIBUTION_CONCURRENCY) {
        config.concurrency.distribution = parse_number(DISTRIBUTION_CONCURRENCY, &v)?;
    }
    if let Some(v) = get(CLEANUP_TIMEOUT_SECS) {
        config.cleanup_timeout_secs = Some(parse_number(CLEANUP_TIMEOUT_SECS, &v)?);
    }

    debug!("applied environment overrides");
    Ok(())
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(name, format!("'{}' is not a number", value)))
}
