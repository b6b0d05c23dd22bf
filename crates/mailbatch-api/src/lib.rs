//! # mailbatch-api
//!
//! Typed client for the NotLetters mail-provisioning API.
//!
//! ## Features
//!
//! - **Account info**: balance and username (`GET me`)
//! - **Password change**: rotate the password of one mailbox
//! - **Letter listing**: fetch letters of one mailbox, with search/star filters
//! - **Purchase**: buy new mailboxes by category
//!
//! Every call performs exactly one request and never retries. Failures are
//! classified into [`ApiError`] variants so callers can turn them into data.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailbatch_api::{ApiClient, Endpoints, LetterFilter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(Endpoints::notletters()?, "your_api_token");
//!
//!     let profile = client.me().await?;
//!     println!("{}: {} RUB", profile.username(), profile.balance);
//!
//!     let filter = LetterFilter::new().with_search("invoice");
//!     let letters = client.letters("user@example.com", "secret", &filter).await?;
//!     println!("{} letters", letters.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod endpoints;
mod envelope;
mod error;
mod types;

pub use client::{ApiClient, DEFAULT_EXTENDED_TIMEOUT, DEFAULT_TIMEOUT, Timeouts};
pub use endpoints::{DEFAULT_BASE_URL, Endpoints};
pub use error::{ApiError, Result};
pub use types::{EmailType, Letter, LetterBody, LetterFilter, Profile};
