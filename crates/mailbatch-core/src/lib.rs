//! # mailbatch-core
//!
//! Bulk mailbox operations against the `NotLetters` API.
//!
//! This crate provides:
//! - Account file loading
//! - Per-record operations (password change, letter fetch)
//! - A rate-limited batch executor with cancellation
//! - Result aggregation and run artifacts
//! - Settings and keyring token storage

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod account;
pub mod config;
pub mod credentials;
mod error;
pub mod executor;
pub mod export;
pub mod operation;
mod outcome;
pub mod report;
pub mod run;

pub use account::{AccountRecord, LoadedAccounts, SkippedLine, load_accounts, parse_accounts};
pub use config::{Settings, TokenSource, resolve_token};
pub use credentials::{CredentialError, CredentialResult};
pub use error::{Error, Result};
pub use executor::{
    BatchExecutor, BatchPlan, Chunk, ExecutorConfig, NullObserver, Progress, RunObserver,
};
pub use operation::{ChangePassword, FetchLetters, Operation};
pub use outcome::{FailureKind, Outcome};
pub use report::{Aggregator, Payload, RunReport};
pub use run::{
    BulkOperation, JobReport, LetterJob, LetterSummary, PasswordChangeJob, PasswordChangeSummary,
    Runner,
};
