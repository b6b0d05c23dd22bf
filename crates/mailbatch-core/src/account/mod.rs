//! Account records and the account-list loader.

mod loader;
mod record;

pub use loader::{LoadedAccounts, SkippedLine, load_accounts, parse_accounts};
pub use record::AccountRecord;
