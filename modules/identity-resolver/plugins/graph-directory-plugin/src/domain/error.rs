//! Mapping of Graph HTTP failures onto [`DirectoryError`].

use std::time::Duration;

use identity_resolver_sdk::DirectoryError;
use reqwest::StatusCode;
use serde::Deserialize;

/// Graph error envelope: `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Human-readable message of a failed response.
///
/// Prefers Graph's `error.message`, then `error.code`, then the status reason.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| {
            env.error
                .message
                .filter(|m| !m.is_empty())
                .or(env.error.code)
        })
        .unwrap_or_else(|| {
            format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            )
        })
}

/// Classify a non-success status.
pub(crate) fn classify_status(
    status: StatusCode,
    message: String,
    retry_after: Option<Duration>,
) -> DirectoryError {
    match status.as_u16() {
        400 => DirectoryError::BadRequest(message),
        401 | 403 => DirectoryError::Unauthorized(message),
        404 => DirectoryError::NotFound(message),
        429 => DirectoryError::RateLimited {
            message,
            retry_after,
        },
        code => DirectoryError::ServerError {
            status: code,
            message,
        },
    }
}

pub(crate) fn transport(err: &reqwest::Error) -> DirectoryError {
    let kind = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_decode() {
        "undecodable response body"
    } else {
        "request failed"
    };
    DirectoryError::Transport(format!("{kind}: {err}"))
}
