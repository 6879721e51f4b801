//! Error types for key management and signing

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for signing operations
pub type Result<T> = std::result::Result<T, SigningError>;

/// Key-material and signing errors
#[derive(Debug, Error)]
pub enum SigningError {
    /// Refusing to overwrite an existing CA key
    #[error("A CA key already exists at {0}; set FORCE_WRITE=true to replace it")]
    KeyAlreadyExists(PathBuf),

    /// CA key missing
    #[error("No CA key found at {0}")]
    KeyNotFound(PathBuf),

    /// CA key present but unreadable
    #[error("Failed to read the CA key from {path}: {source}")]
    KeyUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backup was not confirmed with the literal confirmation string
    #[error("Did not get confirmation of key export, aborting")]
    ConfirmationRequired,

    /// A certificate without principals would be valid for every user
    #[error("Refusing to sign a certificate without principals")]
    NoPrincipals,

    /// Public key is not an OpenSSH public key line
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Tool not found
    #[error("Signing tool not found: {tool}. {hint}")]
    ToolNotFound { tool: String, hint: String },

    /// Tool execution failed
    #[error("Signing tool failed: {tool} - {reason}")]
    ToolFailed { tool: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
