//! Persisted settings and API token resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::credentials;
use crate::error::{Error, Result};
use crate::executor::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY};

/// Directory name under the platform config directory.
const APP_DIR: &str = "mailbatch";

/// Settings file name.
const CONFIG_FILE: &str = "config.json";

/// Settings that persist across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Provider API token. Prefer the keyring; this is a plaintext fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Provider base URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Records per chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
}

impl Settings {
    /// Default settings path: `<config dir>/mailbatch/config.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(CONFIG_FILE)
    }

    /// Loads settings, returning defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await? {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Saves settings as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Configured concurrency, or the default. Out-of-range values are an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the value is outside `1..=10`.
    pub fn concurrency(&self) -> Result<usize> {
        match self.concurrency {
            None => Ok(DEFAULT_CONCURRENCY),
            Some(c) if (1..=MAX_CONCURRENCY).contains(&c) => Ok(c),
            Some(c) => Err(Error::Config(format!(
                "concurrency must be between 1 and {MAX_CONCURRENCY}, got {c}"
            ))),
        }
    }
}

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Command line flag or environment variable.
    Explicit,
    /// System keyring.
    Keyring,
    /// Settings file.
    Settings,
}

/// Resolves the API token.
///
/// Order: `explicit` (flag or env), then the keyring, then `settings.api_key`.
/// A keyring failure is logged and falls through to the settings file.
///
/// # Errors
///
/// Returns [`Error::MissingToken`] if no source yields a non-blank token.
pub fn resolve_token(explicit: Option<&str>, settings: &Settings) -> Result<(String, TokenSource)> {
    resolve_token_with(explicit, settings, credentials::get_api_token)
}

fn resolve_token_with<F>(
    explicit: Option<&str>,
    settings: &Settings,
    keyring: F,
) -> Result<(String, TokenSource)>
where
    F: FnOnce() -> credentials::CredentialResult<Option<String>>,
{
    let non_blank = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };

    if let Some(token) = explicit.and_then(non_blank) {
        return Ok((token, TokenSource::Explicit));
    }

    match keyring() {
        Ok(Some(token)) => {
            if let Some(token) = non_blank(&token) {
                return Ok((token, TokenSource::Keyring));
            }
        }
        Ok(None) => {}
        Err(e) => warn!("Keyring unavailable: {e}"),
    }

    settings
        .api_key
        .as_deref()
        .and_then(non_blank)
        .map(|token| (token, TokenSource::Settings))
        .ok_or(Error::MissingToken)
}
