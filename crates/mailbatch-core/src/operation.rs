//! Per-record remote operations.
//!
//! An [`Operation`] performs one provider call for one record and always
//! returns an [`Outcome`]: every API error is converted here, so the executor
//! never sees a propagating fault.

use std::future::Future;

use mailbatch_api::{ApiClient, Letter, LetterFilter};

use crate::account::AccountRecord;
use crate::outcome::Outcome;
use crate::report::Payload;

/// One provider call per record.
pub trait Operation: Send + Sync + 'static {
    /// Payload carried by successful outcomes.
    type Payload: Payload + Send + 'static;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the operation for one record.
    fn execute(
        &self,
        record: &AccountRecord,
    ) -> impl Future<Output = Outcome<Self::Payload>> + Send;
}

/// Rotates every mailbox to the same new password.
#[derive(Debug, Clone)]
pub struct ChangePassword {
    client: ApiClient,
    new_password: String,
}

impl ChangePassword {
    /// Creates the operation.
    #[must_use]
    pub fn new(client: ApiClient, new_password: impl Into<String>) -> Self {
        Self {
            client,
            new_password: new_password.into(),
        }
    }

    /// The password every successful record now has.
    #[must_use]
    pub fn new_password(&self) -> &str {
        &self.new_password
    }
}

impl Operation for ChangePassword {
    type Payload = ();

    fn name(&self) -> &'static str {
        "change-password"
    }

    async fn execute(&self, record: &AccountRecord) -> Outcome<()> {
        match self
            .client
            .change_password(&record.email, &record.secret, &self.new_password)
            .await
        {
            Ok(message) => Outcome::success(&record.email, message, None),
            Err(err) => Outcome::from_error(&record.email, &err),
        }
    }
}

/// Lists the letters of every mailbox.
#[derive(Debug, Clone)]
pub struct FetchLetters {
    client: ApiClient,
    filter: LetterFilter,
}

impl FetchLetters {
    /// Creates the operation.
    #[must_use]
    pub const fn new(client: ApiClient, filter: LetterFilter) -> Self {
        Self { client, filter }
    }
}

impl Operation for FetchLetters {
    type Payload = Vec<Letter>;

    fn name(&self) -> &'static str {
        "fetch-letters"
    }

    async fn execute(&self, record: &AccountRecord) -> Outcome<Vec<Letter>> {
        match self
            .client
            .letters(&record.email, &record.secret, &self.filter)
            .await
        {
            Ok(letters) => {
                let message = match letters.len() {
                    0 => "0 letters (empty inbox)".to_string(),
                    1 => "1 letter found".to_string(),
                    n => format!("{n} letters found"),
                };
                Outcome::success(&record.email, message, Some(letters))
            }
            Err(err) => Outcome::from_error(&record.email, &err),
        }
    }
}
