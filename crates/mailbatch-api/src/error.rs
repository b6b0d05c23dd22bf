//! Error types for provider API calls.

/// Result type alias for provider API calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Provider API error types.
///
/// Every variant maps onto one failure class of a single request. Nothing is
/// retried at this layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// HTTP 401 or provider code 401.
    #[error("unauthorized: wrong credential or unknown account")]
    Unauthorized,

    /// The request exceeded its deadline.
    #[error("request timeout")]
    Timeout,

    /// The response body could not be parsed into the expected structure.
    #[error("invalid response format")]
    MalformedResponse {
        /// Parser detail, kept for logging.
        detail: String,
    },

    /// Non-success status with a provider-supplied (or generic) reason.
    #[error("{message}")]
    Rejected {
        /// HTTP status, or the embedded provider code when HTTP said 200.
        status: u16,
        /// Reason taken from the body's `message` or `data` field.
        message: String,
    },

    /// Any other transport-level fault.
    #[error("{0}")]
    Transport(reqwest::Error),

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Creates a malformed-response error from any parser failure.
    #[must_use]
    pub fn malformed(detail: impl std::fmt::Display) -> Self {
        Self::MalformedResponse {
            detail: detail.to_string(),
        }
    }

    /// Creates a rejection with the generic status message.
    #[must_use]
    pub fn rejected_with_status(status: u16) -> Self {
        Self::Rejected {
            status,
            message: format!("failed with status {status}"),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::malformed(err)
        } else {
            Self::Transport(err)
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ApiError::Unauthorized.to_string(),
            "unauthorized: wrong credential or unknown account"
        );
        assert_eq!(ApiError::Timeout.to_string(), "request timeout");
        assert_eq!(
            ApiError::malformed("expected value at line 1").to_string(),
            "invalid response format"
        );
        assert_eq!(
            ApiError::rejected_with_status(503).to_string(),
            "failed with status 503"
        );
    }

    #[test]
    fn test_json_error_is_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("<html>").unwrap_err();
        assert!(matches!(
            ApiError::from(err),
            ApiError::MalformedResponse { .. }
        ));
    }
}
