//! Error types for the MavensMate client

use thiserror::Error;

/// Main error type for command execution
///
/// Every command settles with either a `CommandOutput` or exactly one of
/// these. Collaborator errors pass through unchanged.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Project initialization failed: {0}")]
    Initialization(String),

    #[error("{message}")]
    RemoteOperation {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Editor error: {0}")]
    Delegation(String),

    #[error("Invalid payload: {0}")]
    Payload(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CommandError {
    /// Stable tag for machine-readable output
    pub fn kind(&self) -> &'static str {
        match self {
            CommandError::Validation(_) => "validation",
            CommandError::Authentication(_) => "authentication",
            CommandError::Initialization(_) => "initialization",
            CommandError::RemoteOperation { .. } => "remote_operation",
            CommandError::Delegation(_) => "delegation",
            CommandError::Payload(_) => "payload",
            CommandError::Config(_) => "config",
            CommandError::Io(_) => "io",
            CommandError::Json(_) => "json",
            CommandError::Http(_) => "http",
            CommandError::Internal(_) => "internal",
        }
    }

    /// Shorthand for a remote failure without structured details
    pub fn remote(message: impl Into<String>) -> Self {
        CommandError::RemoteOperation {
            message: message.into(),
            details: None,
        }
    }
}
