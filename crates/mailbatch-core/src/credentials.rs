//! API token storage in the system keyring.
//!
//! Uses the platform's native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::{debug, warn};

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "mailbatch";

/// Entry name for the provider API token.
const API_TOKEN_ENTRY: &str = "api_token";

/// Error type for credential operations.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// Refused to store an empty token.
    #[error("API token must not be empty")]
    EmptyToken,
}

/// Result type for credential operations.
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;

fn api_token_entry() -> CredentialResult<Entry> {
    Ok(Entry::new(SERVICE_NAME, API_TOKEN_ENTRY)?)
}

/// Stores the API token in the system keyring.
///
/// # Errors
///
/// Returns an error if the token is blank or the keyring operation fails.
pub fn store_api_token(token: &str) -> CredentialResult<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CredentialError::EmptyToken);
    }
    api_token_entry()?.set_password(token)?;
    debug!("Stored API token in keyring");
    Ok(())
}

/// Retrieves the API token from the system keyring.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn get_api_token() -> CredentialResult<Option<String>> {
    match api_token_entry()?.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => {
            debug!("No API token found in keyring");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Deletes the API token from the keyring. A missing entry is not an error.
///
/// # Errors
///
/// Returns an error if the keyring operation fails.
pub fn delete_api_token() -> CredentialResult<()> {
    match api_token_entry()?.delete_credential() {
        Ok(()) => {
            debug!("Deleted API token from keyring");
            Ok(())
        }
        Err(keyring::Error::NoEntry) => {
            debug!("No API token to delete");
            Ok(())
        }
        Err(e) => {
            warn!("Failed to delete API token: {e}");
            Err(e.into())
        }
    }
}
