use thiserror::Error;

/// Errors returned by the client-credentials flow.
///
/// No variant ever carries the client secret, an access token or the body of
/// a token endpoint response.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// Transport failure or non-success status from the token endpoint.
    #[error("{0}")]
    Http(String),

    /// The token endpoint returned an unparseable or incomplete response.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// The token endpoint returned a `token_type` that is not `Bearer`.
    #[error("unsupported token type: {0}")]
    UnsupportedTokenType(String),

    /// Configuration is invalid.
    #[error("OAuth2 config error: {0}")]
    ConfigError(String),
}

impl TokenError {
    pub(crate) fn status(status: reqwest::StatusCode) -> Self {
        TokenError::Http(format!("OAuth2 token HTTP {status}"))
    }

    pub(crate) fn transport(err: reqwest::Error) -> Self {
        TokenError::Http(format!("OAuth2 token request failed: {}", err.without_url()))
    }
}
