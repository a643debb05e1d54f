//! Error types for the identity resolver SDK.

use std::time::Duration;

use thiserror::Error;

/// Tagged failure of a single directory call.
///
/// Transport implementations classify every failure into exactly one of
/// these variants so that callers can branch with a total `match` instead of
/// inspecting status codes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// The addressed identity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The directory rejected the request shape (e.g. an unsupported key format).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Credentials were missing, invalid, or lack the required permission.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The directory throttled the caller.
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        /// Server-suggested wait before the next attempt, if it sent one.
        retry_after: Option<Duration>,
    },

    /// Any other non-success response.
    #[error("server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// The request never produced a usable response (connect, timeout, decode).
    #[error("transport error: {0}")]
    Transport(String),
}

/// A value could not be parsed from its textual form.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {what} '{value}' (expected one of: {expected})")]
pub struct ParseError {
    pub what: &'static str,
    pub value: String,
    pub expected: &'static str,
}
