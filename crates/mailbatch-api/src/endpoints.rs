//! Provider endpoint configuration.

use crate::error::Result;
use url::Url;

/// Base URL of the public NotLetters deployment.
pub const DEFAULT_BASE_URL: &str = "https://api.notletters.com/v1/";

/// Resolved endpoint URLs for one provider deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Base URL every endpoint is joined onto.
    pub base: Url,
    /// Account information and balance.
    pub me: Url,
    /// Password change for a single mailbox.
    pub change_password: Url,
    /// Letter listing for a single mailbox.
    pub letters: Url,
    /// Mailbox purchase.
    pub buy_emails: Url,
}

impl Endpoints {
    /// Builds endpoints relative to a base URL.
    ///
    /// A missing trailing slash is added so the last path segment of the base
    /// is kept when joining.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or a joined endpoint is invalid.
    pub fn from_base(base: impl AsRef<str>) -> Result<Self> {
        let mut raw = base.as_ref().trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)?;

        Ok(Self {
            me: base.join("me")?,
            change_password: base.join("change-password")?,
            letters: base.join("letters")?,
            buy_emails: base.join("buy-emails")?,
            base,
        })
    }

    /// Endpoints of the public NotLetters deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn notletters() -> Result<Self> {
        Self::from_base(DEFAULT_BASE_URL)
    }
}
