//! Per-record outcome of a remote operation.

use mailbatch_api::ApiError;
use tracing::debug;

/// Why a record's operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FailureKind {
    /// Wrong credential or unknown account.
    Unauthorized,
    /// The call exceeded its deadline.
    Timeout,
    /// The provider returned an unparseable body.
    MalformedResponse,
    /// Connectivity failure.
    Transport,
    /// Non-200 provider status with a reason.
    ProviderRejected,
    /// The run was cancelled while the call was in flight.
    Cancelled,
    /// The unit of work aborted without producing a result.
    Internal,
}

impl FailureKind {
    /// Short label for summaries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Timeout => "timeout",
            Self::MalformedResponse => "malformed response",
            Self::Transport => "transport",
            Self::ProviderRejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }
}

impl From<&ApiError> for FailureKind {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Unauthorized => Self::Unauthorized,
            ApiError::Timeout => Self::Timeout,
            ApiError::MalformedResponse { .. } => Self::MalformedResponse,
            ApiError::Rejected { .. } => Self::ProviderRejected,
            ApiError::Transport(_) => Self::Transport,
            ApiError::InvalidConfig(_) | ApiError::Url(_) => Self::Internal,
        }
    }
}

/// Result of running an operation for one account.
///
/// Exactly one outcome exists per dispatched record. Failures are data: an
/// outcome with a [`FailureKind`], never a propagated error.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    /// Email of the record this outcome belongs to.
    pub email: String,
    /// Provider message or failure reason.
    pub message: String,
    /// Operation-specific payload, present on success when the operation has one.
    pub payload: Option<T>,
    /// Failure class, `None` on success.
    pub failure: Option<FailureKind>,
}

impl<T> Outcome<T> {
    /// Creates a successful outcome.
    #[must_use]
    pub fn success(email: impl Into<String>, message: impl Into<String>, payload: Option<T>) -> Self {
        Self {
            email: email.into(),
            message: message.into(),
            payload,
            failure: None,
        }
    }

    /// Creates a failed outcome.
    #[must_use]
    pub fn failure(email: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            message: message.into(),
            payload: None,
            failure: Some(kind),
        }
    }

    /// Converts an API error into a failed outcome.
    #[must_use]
    pub fn from_error(email: impl Into<String>, err: &ApiError) -> Self {
        let email = email.into();
        if let ApiError::MalformedResponse { detail } = err {
            debug!(%email, %detail, "Malformed provider response");
        }
        Self::failure(email, FailureKind::from(err), err.to_string())
    }

    /// Whether the operation succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let outcome: Outcome<()> = Outcome::success("a@example.com", "done", None);
        assert!(outcome.is_success());
        assert!(outcome.failure.is_none());
        assert_eq!(outcome.message, "done");
    }

    #[test]
    fn test_from_error_keeps_reason() {
        let outcome: Outcome<()> = Outcome::from_error("a@example.com", &ApiError::Unauthorized);
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure, Some(FailureKind::Unauthorized));
        assert_eq!(
            outcome.message,
            "unauthorized: wrong credential or unknown account"
        );

        let outcome: Outcome<()> = Outcome::from_error("a@example.com", &ApiError::Timeout);
        assert_eq!(outcome.failure, Some(FailureKind::Timeout));
        assert_eq!(outcome.message, "request timeout");
    }

    #[test]
    fn test_rejection_maps_to_provider_rejected() {
        let err = ApiError::rejected_with_status(500);
        let outcome: Outcome<()> = Outcome::from_error("a@example.com", &err);
        assert_eq!(outcome.failure, Some(FailureKind::ProviderRejected));
        assert_eq!(outcome.message, "failed with status 500");
    }

    #[test]
    fn test_malformed() {
        let outcome: Outcome<()> =
            Outcome::from_error("a@example.com", &ApiError::malformed("eof"));
        assert_eq!(outcome.failure, Some(FailureKind::MalformedResponse));
        assert_eq!(outcome.message, "invalid response format");
    }
}
