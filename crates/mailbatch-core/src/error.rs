//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in core operations.
///
/// Per-account failures never surface here: they are recorded as failed
/// [`Outcome`](crate::Outcome)s. These errors stop a whole run.
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The account file yielded no usable records.
    #[error("No valid accounts found in {}", .0.display())]
    NoAccounts(PathBuf),

    /// No API token could be resolved.
    #[error("API token is required: pass --token, set MAILBATCH_TOKEN, or run `token set`")]
    MissingToken,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential storage error.
    #[error("Credential error: {0}")]
    Credential(#[from] crate::credentials::CredentialError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
