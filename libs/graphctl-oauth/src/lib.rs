//! `OAuth2` client-credentials support for graphctl.
//!
//! [`ClientCredentialsToken`] exchanges a client id and secret for a bearer
//! token at the configured token endpoint and caches it until shortly before
//! it expires. Consumers depend on the [`TokenSource`] trait so that tests can
//! substitute a fixed token.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod config;
mod error;
mod secret;
mod source;
mod types;

pub use config::{
    DEFAULT_SCOPE, MAX_TOKEN_LIFETIME, MIN_TOKEN_LIFETIME, OAuthClientConfig, entra_token_endpoint,
};
pub use error::TokenError;
pub use secret::SecretString;
pub use source::{ClientCredentialsToken, StaticToken, TokenSource};
pub use types::ClientAuthMethod;
