//! Run orchestration: load accounts, execute, persist artifacts.
//!
//! The CLI builds a [`PasswordChangeJob`] or [`LetterJob`] and hands it to a
//! [`Runner`]. Nothing here reads from a terminal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mailbatch_api::{ApiClient, Letter, LetterFilter};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::account::{AccountRecord, load_accounts};
use crate::error::{Error, Result};
use crate::executor::{BatchExecutor, RunObserver};
use crate::export;
use crate::operation::{ChangePassword, FetchLetters};
use crate::report::RunReport;

/// Rotate every account in a file to one new password.
#[derive(Debug, Clone)]
pub struct PasswordChangeJob {
    /// Account file.
    pub accounts: PathBuf,
    /// Password every account is changed to.
    pub new_password: String,
    /// Where successful `email:new_password` lines are written.
    pub results_path: PathBuf,
    /// Where the full roster is written.
    pub roster_path: PathBuf,
}

impl PasswordChangeJob {
    /// Creates a job writing the default artifact names into the current directory.
    #[must_use]
    pub fn new(accounts: impl Into<PathBuf>, new_password: impl Into<String>) -> Self {
        Self {
            accounts: accounts.into(),
            new_password: new_password.into(),
            results_path: PathBuf::from(export::RESULTS_FILE),
            roster_path: PathBuf::from(export::ROSTER_FILE),
        }
    }

    /// Sets both output paths.
    #[must_use]
    pub fn outputs(mut self, results: impl Into<PathBuf>, roster: impl Into<PathBuf>) -> Self {
        self.results_path = results.into();
        self.roster_path = roster.into();
        self
    }
}

/// Fetch the letters of every account in a file.
#[derive(Debug, Clone)]
pub struct LetterJob {
    /// Account file.
    pub accounts: PathBuf,
    /// Search and star filters.
    pub filter: LetterFilter,
    /// Where letters are saved; `None` skips saving.
    pub save_dir: Option<PathBuf>,
}

impl LetterJob {
    /// Creates a job that saves into the default letters directory.
    #[must_use]
    pub fn new(accounts: impl Into<PathBuf>, filter: LetterFilter) -> Self {
        Self {
            accounts: accounts.into(),
            filter,
            save_dir: Some(PathBuf::from(export::LETTERS_DIR)),
        }
    }

    /// Sets or clears the save directory.
    #[must_use]
    pub fn save_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.save_dir = dir;
        self
    }
}

/// A bulk operation over an account file.
#[derive(Debug, Clone)]
pub enum BulkOperation {
    /// Password rotation.
    PasswordChange(PasswordChangeJob),
    /// Mailbox retrieval.
    FetchLetters(LetterJob),
}

/// Result of a password change run.
#[derive(Debug)]
pub struct PasswordChangeSummary {
    /// Aggregated outcomes.
    pub report: RunReport<()>,
    /// Results file, when at least one change succeeded.
    pub results_path: Option<PathBuf>,
    /// Roster file.
    pub roster_path: PathBuf,
    /// Account lines that could not be parsed.
    pub skipped_lines: usize,
}

/// Result of a letter fetch run.
#[derive(Debug)]
pub struct LetterSummary {
    /// Aggregated outcomes.
    pub report: RunReport<Vec<Letter>>,
    /// Mailbox directories written, one per account with mail.
    pub saved: Vec<PathBuf>,
    /// Manifest file, when letters were saved.
    pub manifest_path: Option<PathBuf>,
    /// Account lines that could not be parsed.
    pub skipped_lines: usize,
}

/// Result of a [`BulkOperation`].
#[derive(Debug)]
pub enum JobReport {
    /// Password rotation summary.
    PasswordChange(PasswordChangeSummary),
    /// Mailbox retrieval summary.
    FetchLetters(LetterSummary),
}

impl JobReport {
    /// Whether cancellation cut the run short.
    #[must_use]
    pub const fn interrupted(&self) -> bool {
        match self {
            Self::PasswordChange(summary) => summary.report.interrupted,
            Self::FetchLetters(summary) => summary.report.interrupted,
        }
    }
}

/// Runs bulk jobs with one client and executor.
#[derive(Debug, Clone)]
pub struct Runner {
    client: ApiClient,
    executor: BatchExecutor,
}

impl Runner {
    /// Creates a runner.
    #[must_use]
    pub const fn new(client: ApiClient, executor: BatchExecutor) -> Self {
        Self { client, executor }
    }

    /// Runs any bulk operation.
    ///
    /// # Errors
    ///
    /// See [`Self::change_passwords`] and [`Self::fetch_letters`].
    pub async fn run<R>(
        &self,
        operation: BulkOperation,
        observer: &mut R,
        cancel: &CancellationToken,
    ) -> Result<JobReport>
    where
        R: RunObserver<()> + RunObserver<Vec<Letter>>,
    {
        match operation {
            BulkOperation::PasswordChange(job) => self
                .change_passwords(&job, observer, cancel)
                .await
                .map(JobReport::PasswordChange),
            BulkOperation::FetchLetters(job) => self
                .fetch_letters(&job, observer, cancel)
                .await
                .map(JobReport::FetchLetters),
        }
    }

    /// Changes the password of every account, then writes the results and
    /// roster files. Files are written for interrupted runs too.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty new password and
    /// [`Error::NoAccounts`] when the file has no usable records. Both are
    /// checked before any network call. I/O errors are returned as-is.
    pub async fn change_passwords<R>(
        &self,
        job: &PasswordChangeJob,
        observer: &mut R,
        cancel: &CancellationToken,
    ) -> Result<PasswordChangeSummary>
    where
        R: RunObserver<()> + ?Sized,
    {
        if job.new_password.trim().is_empty() {
            return Err(Error::Config("new password must not be empty".to_string()));
        }

        let (records, skipped_lines) = load_records(&job.accounts).await?;
        let operation = Arc::new(ChangePassword::new(self.client.clone(), &job.new_password));
        let report = self
            .executor
            .run(&records, operation, observer, cancel)
            .await;

        let results_path = if report.succeeded > 0 {
            export::write_results(&job.results_path, &report, &job.new_password).await?;
            info!(path = %job.results_path.display(), count = report.succeeded, "Wrote results");
            Some(job.results_path.clone())
        } else {
            None
        };

        export::write_roster(&job.roster_path, &records, &report, &job.new_password).await?;
        info!(path = %job.roster_path.display(), count = records.len(), "Wrote roster");

        Ok(PasswordChangeSummary {
            report,
            results_path,
            roster_path: job.roster_path.clone(),
            skipped_lines,
        })
    }

    /// Fetches the letters of every account and optionally saves them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAccounts`] when the file has no usable records, or an
    /// I/O error if saving fails.
    pub async fn fetch_letters<R>(
        &self,
        job: &LetterJob,
        observer: &mut R,
        cancel: &CancellationToken,
    ) -> Result<LetterSummary>
    where
        R: RunObserver<Vec<Letter>> + ?Sized,
    {
        let (records, skipped_lines) = load_records(&job.accounts).await?;
        let operation = Arc::new(FetchLetters::new(self.client.clone(), job.filter.clone()));
        let report = self
            .executor
            .run(&records, operation, observer, cancel)
            .await;

        let mut saved = Vec::new();
        let mut manifest_path = None;
        if let Some(dir) = job.save_dir.as_deref()
            && report.with_content > 0
        {
            for (email, letters) in report.with_mail() {
                saved.push(export::save_letters(dir, email, letters).await?);
            }
            manifest_path = Some(export::write_mail_manifest(dir, &records, &report).await?);
            info!(
                dir = %dir.display(),
                mailboxes = saved.len(),
                letters = report.total_letters(),
                "Saved letters"
            );
        }

        Ok(LetterSummary {
            report,
            saved,
            manifest_path,
            skipped_lines,
        })
    }
}

async fn load_records(path: &Path) -> Result<(Vec<AccountRecord>, usize)> {
    let loaded = load_accounts(path).await?;
    if loaded.is_empty() {
        warn!(path = %path.display(), "No valid accounts found");
        return Err(Error::NoAccounts(path.to_path_buf()));
    }
    Ok((loaded.records, loaded.skipped.len()))
}
