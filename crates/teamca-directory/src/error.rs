//! Error types for team directory operations

use thiserror::Error;

/// Result type alias for directory operations
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Team directory store and distribution errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Nothing stored at the path
    #[error("No such file in the team directory: {0}")]
    NotFound(String),

    /// Path outside the store's namespace
    #[error("Path is not inside the team directory: {0}")]
    InvalidPath(String),

    /// The CA account cannot see a configured team
    #[error("The CA account cannot access team '{team}'; add it to the team first")]
    TeamNotAccessible { team: String },

    /// Store CLI missing
    #[error("Store tool not found: {tool}. {hint}")]
    ToolNotFound { tool: String, hint: String },

    /// Command execution error
    #[error("Command '{command}' failed with exit code {status}: {stderr}")]
    Command {
        command: String,
        status: i32,
        stderr: String,
    },

    /// Bot account name could not be determined
    #[error("Failed to resolve the bot account: {0}")]
    Identity(String),

    /// A fan-out task panicked or was cancelled
    #[error("Background task for team '{team}' failed: {reason}")]
    TaskFailed { team: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DirectoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
