//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::CaConfig;

/// Validate configuration invariants that parsing alone cannot enforce
pub fn validate_config(config: &CaConfig) -> Result<()> {
    debug!("validating configuration");
    validate_key_location(config)?;
    validate_teams(config)?;
    validate_expiration(config)?;
    validate_concurrency(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_key_location(config: &CaConfig) -> Result<()> {
    if config.ca_key_location.as_os_str().is_empty() {
        return Err(ConfigError::MissingField("ca_key_location".to_string()));
    }
    Ok(())
}

fn validate_team_name(field: &str, team: &str) -> Result<()> {
    if team.trim().is_empty() {
        return Err(ConfigError::invalid(field, "team name cannot be empty"));
    }
    if team.contains('/') || team.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(
            field,
            format!("'{}' is not a valid team name", team),
        ));
    }
    Ok(())
}

fn validate_teams(config: &CaConfig) -> Result<()> {
    if config.teams.is_empty() && config.chat_channel.is_none() {
        return Err(ConfigError::invalid(
            "teams",
            "at least one team is required unless a chat channel is configured",
        ));
    }

    for (i, team) in config.teams.iter().enumerate() {
        validate_team_name(&format!("teams[{}]", i), team)?;
    }

    if let Some(chat_team) = config.chat_team() {
        validate_team_name("chat_channel", chat_team)?;
    }

    Ok(())
}

fn validate_expiration(config: &CaConfig) -> Result<()> {
    if config.key_expiration().is_zero() {
        return Err(ConfigError::invalid(
            "key_expiration",
            "expiration must be strictly positive",
        ));
    }
    Ok(())
}

fn validate_concurrency(config: &CaConfig) -> Result<()> {
    if config.concurrency.maintenance == 0 {
        return Err(ConfigError::invalid(
            "concurrency.maintenance",
            "must be at least 1",
        ));
    }
    if config.concurrency.distribution == 0 {
        return Err(ConfigError::invalid(
            "concurrency.distribution",
            "must be at least 1",
        ));
    }
    Ok(())
}
