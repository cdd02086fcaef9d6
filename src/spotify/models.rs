use serde::{Deserialize, Serialize};

/// Token endpoint response, for both the authorization code exchange and
/// the refresh grant. Spotify omits `refresh_token` on refresh responses.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// A freshly refreshed access token with its absolute expiry, epoch millis.
#[derive(Clone, Debug)]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_at_ms: i64,
}
