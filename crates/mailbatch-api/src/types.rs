//! Request and response types of the provider API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Deserializes a missing or `null` field as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Account information returned by `GET me`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Remaining balance in RUB.
    #[serde(default, deserialize_with = "null_as_default")]
    pub balance: f64,
    /// Account username.
    #[serde(default)]
    pub username: Option<String>,
    /// Allowed requests per second.
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl Profile {
    /// Username, or `Unknown` when the provider omitted it.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or("Unknown")
    }
}

/// Body of a letter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LetterBody {
    /// Plain text content.
    #[serde(default)]
    pub text: Option<String>,
    /// HTML content.
    #[serde(default)]
    pub html: Option<String>,
}

/// A letter received by a mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Letter {
    /// Provider letter identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Sender address.
    #[serde(default)]
    pub sender: Option<String>,
    /// Sender display name.
    #[serde(default)]
    pub sender_name: Option<String>,
    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// Receive time as a Unix timestamp.
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: i64,
    /// Whether the letter is starred.
    #[serde(default, deserialize_with = "null_as_default")]
    pub star: bool,
    /// Letter body.
    #[serde(default)]
    pub letter: Option<LetterBody>,
}

impl Letter {
    /// Identifier, or `unknown`.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("unknown")
    }

    /// Sender address, or `unknown`.
    #[must_use]
    pub fn sender(&self) -> &str {
        self.sender.as_deref().unwrap_or("unknown")
    }

    /// Sender display name, or `Unknown`.
    #[must_use]
    pub fn sender_name(&self) -> &str {
        self.sender_name.as_deref().unwrap_or("Unknown")
    }

    /// Subject, or `No Subject`.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or("No Subject")
    }

    /// Plain text body, or a placeholder when absent.
    #[must_use]
    pub fn text(&self) -> &str {
        self.letter
            .as_ref()
            .and_then(|body| body.text.as_deref())
            .unwrap_or("No content available")
    }

    /// Receive time in UTC.
    #[must_use]
    pub fn received_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.date, 0).unwrap_or_default()
    }
}

/// Filters applied when listing letters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LetterFilter {
    /// Keyword search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Only starred (or only unstarred) letters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub star: Option<bool>,
}

impl LetterFilter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search keyword. Empty keywords are ignored.
    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = (!search.trim().is_empty()).then_some(search);
        self
    }

    /// Restricts the listing to starred letters.
    #[must_use]
    pub const fn starred_only(mut self) -> Self {
        self.star = Some(true);
        self
    }
}

/// Category of mailbox offered for purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmailType {
    /// Limited mailboxes.
    #[default]
    Limited,
    /// Unlimited mailboxes.
    Unlimited,
    /// Mailboxes in the RU zone.
    RuZone,
    /// Personal mailboxes.
    Personal,
}

impl EmailType {
    /// Numeric code sent as `type_email`.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Limited => 0,
            Self::Unlimited => 1,
            Self::RuZone => 2,
            Self::Personal => 3,
        }
    }

    /// Get display name for the mailbox type.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Limited => "Limited",
            Self::Unlimited => "Unlimited",
            Self::RuZone => "RU Zone",
            Self::Personal => "Personal",
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChangePasswordRequest<'a> {
    pub email: &'a str,
    pub new_password: &'a str,
    pub old_password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LettersRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub filters: &'a LetterFilter,
}

#[derive(Debug, Serialize)]
pub(crate) struct BuyEmailsRequest {
    pub count: u32,
    pub type_email: u8,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LettersData {
    #[serde(default)]
    pub letters: Vec<Letter>,
}
