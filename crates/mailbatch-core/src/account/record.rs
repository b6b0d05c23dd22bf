//! Account record type.

/// One mailbox identity plus the credential the provider needs for it.
///
/// Records are never mutated once loaded; each unit of work gets its own clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountRecord {
    /// Email address.
    pub email: String,
    /// Current password of the mailbox.
    pub secret: String,
}

impl AccountRecord {
    /// Create a new record.
    #[must_use]
    pub fn new(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
        }
    }

    /// Parse an `email:secret` line.
    ///
    /// The line is split at the first `:` so secrets may contain colons.
    /// Both halves are trimmed. Returns `None` when there is no separator or
    /// the email half is empty.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let (email, secret) = line.split_once(':')?;
        let email = email.trim();
        if email.is_empty() {
            return None;
        }
        Some(Self::new(email, secret.trim()))
    }

    /// Render the record in account-file form with the given secret.
    #[must_use]
    pub fn line_with(&self, secret: &str) -> String {
        format!("{}:{secret}", self.email)
    }
}
