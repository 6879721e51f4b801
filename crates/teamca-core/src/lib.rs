//! teamca core - configuration and shared error types
//!
//! This crate is the Config Provider for the teamca SSH certificate
//! authority. It loads configuration from defaults, an optional file and the
//! process environment, and validates it before any other component runs.

pub mod config;
pub mod error;

pub use config::{
    load_config, load_config_from_sources, validate_config, CaConfig, ChatChannel,
    ConcurrencyConfig, KeyExpiration, StoreConfig,
};
pub use error::{ConfigError, Result};
