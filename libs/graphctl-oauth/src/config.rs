use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::TokenError;
use crate::secret::SecretString;
use crate::types::ClientAuthMethod;

/// Scope requesting every application permission granted on Microsoft Graph.
pub const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Shortest lifetime assumed for a freshly issued token.
pub const MIN_TOKEN_LIFETIME: Duration = Duration::from_secs(60);

/// Longest lifetime trusted from a token response.
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for the client-credentials flow.
///
/// `Debug` is implemented by hand to redact [`client_secret`](Self::client_secret).
#[derive(Clone)]
pub struct OAuthClientConfig {
    pub token_endpoint: Url,

    pub client_id: String,

    pub client_secret: SecretString,

    /// Requested scopes, space-joined on the wire.
    pub scopes: Vec<String>,

    pub auth_method: ClientAuthMethod,

    /// Lifetime assumed when the endpoint omits `expires_in` (default: 5 min).
    pub default_ttl: Duration,

    /// How long before expiry a cached token stops being handed out (default: 60 s).
    pub refresh_skew: Duration,

    /// Timeout of a single token request (default: 30 s).
    pub timeout: Duration,
}

impl OAuthClientConfig {
    /// Configuration with default policy for the given endpoint and credentials.
    #[must_use]
    pub fn new(
        token_endpoint: Url,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Self {
        Self {
            token_endpoint,
            client_id: client_id.into(),
            client_secret,
            scopes: vec![DEFAULT_SCOPE.to_owned()],
            auth_method: ClientAuthMethod::default(),
            default_ttl: Duration::from_secs(5 * 60),
            refresh_skew: Duration::from_secs(60),
            timeout: Duration::from_secs(30),
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ConfigError`] if the client id is blank, the
    /// secret is empty, or the endpoint is not an http(s) URL.
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.client_id.trim().is_empty() {
            return Err(TokenError::ConfigError(
                "client_id must not be empty".into(),
            ));
        }
        if self.client_secret.is_empty() {
            return Err(TokenError::ConfigError(
                "client_secret must not be empty".into(),
            ));
        }
        match self.token_endpoint.scheme() {
            "http" | "https" => Ok(()),
            other => Err(TokenError::ConfigError(format!(
                "token_endpoint must be an http(s) URL, got scheme '{other}'"
            ))),
        }
    }
}

/// `Debug` redacts `client_secret`.
impl fmt::Debug for OAuthClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthClientConfig")
            .field("token_endpoint", &self.token_endpoint.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("scopes", &self.scopes)
            .field("auth_method", &self.auth_method)
            .field("default_ttl", &self.default_ttl)
            .field("refresh_skew", &self.refresh_skew)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Token endpoint of a Microsoft Entra tenant:
/// `{authority_host}/{tenant_id}/oauth2/v2.0/token`.
///
/// # Errors
///
/// Returns [`TokenError::ConfigError`] if the tenant is blank or the
/// resulting URL does not parse.
pub fn entra_token_endpoint(authority_host: &str, tenant_id: &str) -> Result<Url, TokenError> {
    let tenant = tenant_id.trim();
    if tenant.is_empty() {
        return Err(TokenError::ConfigError("tenant_id must not be empty".into()));
    }
    let authority = authority_host.trim().trim_end_matches('/');
    Url::parse(&format!("{authority}/{tenant}/oauth2/v2.0/token"))
        .map_err(|e| TokenError::ConfigError(format!("invalid authority host '{authority}': {e}")))
}
