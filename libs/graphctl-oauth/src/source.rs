use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tokio::sync::Mutex;
use url::Url;
use zeroize::Zeroizing;

use crate::config::{MAX_TOKEN_LIFETIME, MIN_TOKEN_LIFETIME, OAuthClientConfig};
use crate::error::TokenError;
use crate::secret::SecretString;
use crate::types::{ClientAuthMethod, TokenResponse};

/// Source of bearer tokens for outbound requests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a token that is valid for at least the configured skew.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] when no token can be obtained.
    async fn access_token(&self) -> Result<SecretString, TokenError>;
}

/// A fixed token. Useful against local mock directories.
#[derive(Debug, Clone)]
pub struct StaticToken(SecretString);

impl StaticToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token))
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<SecretString, TokenError> {
        Ok(self.0.clone())
    }
}

struct CachedToken {
    value: SecretString,
    expires_at: Instant,
}

/// Client-credentials token source with an in-memory cache.
///
/// Access is serialized: concurrent callers wait on the same refresh instead
/// of each hitting the token endpoint.
pub struct ClientCredentialsToken {
    client: reqwest::Client,
    token_endpoint: Url,
    client_id: String,
    client_secret: SecretString,
    /// Pre-joined scopes, or `None` when the scope list is empty.
    scopes: Option<String>,
    auth_method: ClientAuthMethod,
    default_ttl: Duration,
    refresh_skew: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsToken {
    /// Build a token source. No request is made until the first
    /// [`access_token`](TokenSource::access_token) call.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::ConfigError`] if the config is invalid and
    /// [`TokenError::Http`] if the HTTP client cannot be built.
    pub fn new(config: OAuthClientConfig) -> Result<Self, TokenError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(TokenError::transport)?;

        let scopes = if config.scopes.is_empty() {
            None
        } else {
            Some(config.scopes.join(" "))
        };

        Ok(Self {
            client,
            token_endpoint: config.token_endpoint,
            client_id: config.client_id,
            client_secret: config.client_secret,
            scopes,
            auth_method: config.auth_method,
            default_ttl: config.default_ttl,
            refresh_skew: config.refresh_skew,
            cached: Mutex::new(None),
        })
    }

    async fn request_token(&self) -> Result<CachedToken, TokenError> {
        // -- build form fields ---------------------------------------------------
        let mut fields: Vec<(&str, &str)> = vec![("grant_type", "client_credentials")];

        if let Some(ref scope) = self.scopes {
            fields.push(("scope", scope));
        }

        if self.auth_method == ClientAuthMethod::Form {
            fields.push(("client_id", &self.client_id));
            fields.push(("client_secret", self.client_secret.expose()));
        }

        // -- build request -------------------------------------------------------
        let mut builder = self
            .client
            .post(self.token_endpoint.clone())
            .header(ACCEPT, "application/json");

        if self.auth_method == ClientAuthMethod::Basic {
            let credentials = Zeroizing::new(format!(
                "{}:{}",
                self.client_id,
                self.client_secret.expose()
            ));
            let encoded = Zeroizing::new(general_purpose::STANDARD.encode(credentials.as_bytes()));
            let header_value = Zeroizing::new(format!("Basic {}", &*encoded));
            builder = builder.header(AUTHORIZATION, header_value.as_str());
        }

        tracing::debug!(endpoint = %self.token_endpoint, "requesting access token");
        let response = builder
            .form(&fields)
            .send()
            .await
            .map_err(TokenError::transport)?;

        // -- check status, then parse response ------------------------------------
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "token endpoint rejected the request");
            return Err(TokenError::status(status));
        }

        let token_resp: TokenResponse = response
            .json()
            .await
            .map_err(|e| TokenError::InvalidResponse(e.without_url().to_string()))?;

        if let Some(ref tt) = token_resp.token_type
            && !tt.eq_ignore_ascii_case("bearer")
        {
            return Err(TokenError::UnsupportedTokenType(tt.clone()));
        }

        let access_token = token_resp
            .access_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| TokenError::InvalidResponse("missing access_token".into()))?;

        // -- compute lifetime ----------------------------------------------------
        let lifetime = token_lifetime(token_resp.expires_in, self.default_ttl, self.refresh_skew);
        let expires_at = Instant::now()
            .checked_add(lifetime)
            .ok_or_else(|| TokenError::InvalidResponse("token lifetime out of range".into()))?;
        tracing::info!(lifetime_secs = lifetime.as_secs(), "access token acquired");

        Ok(CachedToken {
            value: SecretString::new(access_token),
            expires_at,
        })
    }
}

#[async_trait]
impl TokenSource for ClientCredentialsToken {
    async fn access_token(&self) -> Result<SecretString, TokenError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref()
            && is_fresh(token.expires_at, self.refresh_skew, Instant::now())
        {
            return Ok(token.value.clone());
        }

        let token = self.request_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

/// Lifetime used for cache bookkeeping.
///
/// Capped at [`MAX_TOKEN_LIFETIME`] and floored so that a fresh token
/// outlives the refresh skew by at least a second.
fn token_lifetime(expires_in: Option<u64>, default_ttl: Duration, skew: Duration) -> Duration {
    let floor = MIN_TOKEN_LIFETIME.max(skew.saturating_add(Duration::from_secs(1)));
    expires_in
        .map_or(default_ttl, Duration::from_secs)
        .min(MAX_TOKEN_LIFETIME)
        .max(floor)
}

/// A token stays usable until `skew` before it expires.
fn is_fresh(expires_at: Instant, skew: Duration, now: Instant) -> bool {
    expires_at
        .checked_sub(skew)
        .is_some_and(|refresh_at| now < refresh_at)
}
