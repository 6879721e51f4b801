//! Configuration types

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::defaults::{
    DEFAULT_CA_KEY_LOCATION, DEFAULT_CONCURRENCY, DEFAULT_KEYBASE_BINARY, DEFAULT_KEY_EXPIRATION,
};
use crate::error::ConfigError;

/// Main configuration for the certificate authority
///
/// Immutable once validated; every command receives a shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaConfig {
    /// Where the CA private key lives on disk
    pub ca_key_location: PathBuf,

    /// Teams whose members may request certificates, in configured order
    pub teams: Vec<String>,

    /// Optional chat-team override (`team` or `team#channel`)
    pub chat_channel: Option<ChatChannel>,

    /// How long issued certificates stay valid
    pub key_expiration: KeyExpiration,

    /// Log file location, local or inside the team directory store
    pub log_location: Option<PathBuf>,

    /// Fixed bot account name; resolved from the store account when unset
    pub bot_username: Option<String>,

    /// Team directory store access
    pub store: StoreConfig,

    /// Fan-out limits for store-wide operations
    pub concurrency: ConcurrencyConfig,

    /// Upper bound on shutdown cleanup, unbounded when unset
    pub cleanup_timeout_secs: Option<u64>,
}

impl Default for CaConfig {
    fn default() -> Self {
        Self {
            ca_key_location: PathBuf::from(DEFAULT_CA_KEY_LOCATION),
            teams: Vec::new(),
            chat_channel: None,
            key_expiration: KeyExpiration::default(),
            log_location: None,
            bot_username: None,
            store: StoreConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            cleanup_timeout_secs: None,
        }
    }
}

impl CaConfig {
    /// Teams authorized to request certificates
    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    /// The chat-team override, if configured
    pub fn chat_team(&self) -> Option<&str> {
        self.chat_channel.as_ref().map(|c| c.team.as_str())
    }

    /// Channel within the chat team; empty means "any channel"
    pub fn channel_name(&self) -> &str {
        self.chat_channel
            .as_ref()
            .and_then(|c| c.channel.as_deref())
            .unwrap_or("")
    }

    /// Certificate validity duration
    pub fn key_expiration(&self) -> Duration {
        self.key_expiration.duration()
    }

    /// Shutdown cleanup timeout, if any
    pub fn cleanup_timeout(&self) -> Option<Duration> {
        self.cleanup_timeout_secs.map(Duration::from_secs)
    }
}

/// Team directory store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// keybase CLI used for store and chat access
    pub keybase_binary: String,

    /// Local mount point of the store (e.g. `/keybase`); CLI access when unset
    pub mount: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            keybase_binary: DEFAULT_KEYBASE_BINARY.to_string(),
            mount: None,
        }
    }
}

/// Concurrency limits, each sized once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    /// In-flight store operations for the maintenance scanner
    pub maintenance: usize,

    /// In-flight store operations while publishing or retracting client configs
    pub distribution: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            maintenance: DEFAULT_CONCURRENCY,
            distribution: DEFAULT_CONCURRENCY,
        }
    }
}

fn expiration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\+?(\d+)([smhdw])$").expect("expiration pattern is a valid regex")
    })
}

/// Certificate lifetime written as `+<n><unit>` (units: s, m, h, d, w)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyExpiration(Duration);

impl KeyExpiration {
    /// Wrap an explicit duration
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// The validity duration
    pub fn duration(&self) -> Duration {
        self.0
    }
}

impl Default for KeyExpiration {
    fn default() -> Self {
        DEFAULT_KEY_EXPIRATION
            .parse()
            .unwrap_or(Self(Duration::from_secs(3600)))
    }
}

impl FromStr for KeyExpiration {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            ConfigError::invalid(
                "key_expiration",
                format!("'{}' must look like +<number><s|m|h|d|w>, e.g. +1h", s),
            )
        };

        let caps = expiration_pattern().captures(s.trim()).ok_or_else(invalid)?;
        let amount: u64 = caps[1].parse().map_err(|_| invalid())?;
        let unit = match &caps[2] {
            "s" => 1,
            "m" => 60,
            "h" => 60 * 60,
            "d" => 24 * 60 * 60,
            _ => 7 * 24 * 60 * 60,
        };
        let secs = amount.checked_mul(unit).ok_or_else(invalid)?;
        Ok(Self(Duration::from_secs(secs)))
    }
}

impl TryFrom<String> for KeyExpiration {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyExpiration> for String {
    fn from(value: KeyExpiration) -> Self {
        value.to_string()
    }
}

impl fmt::Display for KeyExpiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}s", self.0.as_secs())
    }
}

/// Chat-team override: every client is pointed at this team (and channel)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChatChannel {
    /// Team that receives signing requests
    pub team: String,

    /// Channel within the team, any channel when `None`
    pub channel: Option<String>,
}

impl FromStr for ChatChannel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (team, channel) = match s.split_once('#') {
            Some((team, channel)) => (team, Some(channel)),
            None => (s, None),
        };

        if team.is_empty() {
            return Err(ConfigError::invalid(
                "chat_channel",
                format!("'{}' does not name a team", s),
            ));
        }
        if channel.is_some_and(|c| c.is_empty() || c.contains('#')) {
            return Err(ConfigError::invalid(
                "chat_channel",
                format!("'{}' must be formatted as team or team#channel", s),
            ));
        }

        Ok(Self {
            team: team.to_string(),
            channel: channel.map(str::to_string),
        })
    }
}

impl TryFrom<String> for ChatChannel {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChatChannel> for String {
    fn from(value: ChatChannel) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ChatChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.channel {
            Some(channel) => write!(f, "{}#{}", self.team, channel),
            None => write!(f, "{}", self.team),
        }
    }
}
