use serde::{Deserialize, Serialize};

/// How client credentials are sent to the token endpoint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientAuthMethod {
    /// `Authorization: Basic base64(client_id:client_secret)`.
    Basic,
    /// `client_id` and `client_secret` as form fields. Entra ID expects this.
    #[default]
    Form,
}

/// Token endpoint response.
///
/// `Deserialize` only, so an access token can never be serialized back out.
/// `access_token` is optional here and checked by the caller so that a
/// missing token surfaces as an invalid response rather than a decode error.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}
