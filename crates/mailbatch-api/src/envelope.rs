//! Provider response envelope.
//!
//! Every endpoint answers with `{"code": .., "data": .., "message": ..}`.
//! A call succeeded only when the HTTP status is 200 and the embedded code is
//! 200 as well.

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, Result};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

/// Interprets a raw response and returns the envelope's `data` field.
///
/// When the body carries no `code`, the HTTP status stands in for it.
///
/// # Errors
///
/// Returns the failure class matching the response.
pub(crate) fn interpret(status: StatusCode, body: &[u8]) -> Result<Value> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }

    let envelope: Envelope = serde_json::from_slice(body)?;
    let code = envelope.code.unwrap_or_else(|| i64::from(status.as_u16()));

    if status == StatusCode::OK && code == 200 {
        return Ok(envelope.data.unwrap_or(Value::Null));
    }
    if code == 401 {
        return Err(ApiError::Unauthorized);
    }

    let reported = if status == StatusCode::OK {
        u16::try_from(code).unwrap_or(0)
    } else {
        status.as_u16()
    };

    let message = envelope
        .message
        .as_ref()
        .and_then(non_empty_str)
        .or_else(|| envelope.data.as_ref().and_then(non_empty_str))
        .map(str::to_string);

    Err(message.map_or_else(
        || ApiError::rejected_with_status(reported),
        |message| ApiError::Rejected {
            status: reported,
            message,
        },
    ))
}

/// Renders a `data` value as a human-readable message.
pub(crate) fn data_message(data: &Value, fallback: &str) -> String {
    match data {
        Value::Null => fallback.to_string(),
        Value::String(s) if s.is_empty() => fallback.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.trim().is_empty())
}
