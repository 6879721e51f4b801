//! Error types for the service lifecycle and signing bot

use std::time::Duration;

use teamca_core::ConfigError;
use teamca_directory::DirectoryError;
use teamca_signing::SigningError;
use thiserror::Error;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Signing error
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    /// Team directory error
    #[error("Team directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Chat transport failure
    #[error("Chat transport error: {0}")]
    Transport(String),

    /// A chat message that claims to be a bot request but cannot be parsed
    #[error("Malformed bot request: {0}")]
    Protocol(String),

    /// The sender belongs to none of the configured teams
    #[error("User '{0}' is not a member of any authorized team")]
    Unauthorized(String),

    /// Shutdown cleanup outlived its deadline
    #[error("Cleanup did not finish within {0:?}")]
    CleanupTimedOut(Duration),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
