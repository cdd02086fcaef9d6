//! HTTP client for the Spotify accounts and web API hosts.

use super::models::TokenResponse;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TIMEOUT_SEC: u64 = 15;

/// Failures talking to the upstream, split by where the request died.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The upstream answered with an error status; body kept for passthrough.
    #[error("upstream responded with status {status}")]
    ErrorResponse { status: u16, body: String },
    /// The request went out but no response came back.
    #[error("no response from upstream: {0}")]
    NoResponse(String),
    /// The request could not be built or sent at all.
    #[error("failed to set up upstream request: {0}")]
    RequestSetup(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            UpstreamError::NoResponse(err.to_string())
        } else {
            UpstreamError::RequestSetup(err.to_string())
        }
    }
}

#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// Exchanges an authorization code for access and refresh tokens.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, UpstreamError>;

    /// Trades a refresh token for a new access token.
    async fn refresh_access_token(&self, refresh_token: &str)
        -> Result<TokenResponse, UpstreamError>;

    /// Searches playlists. Responses are passed through as-is.
    async fn search_playlists(
        &self,
        access_token: &str,
        query: &str,
        limit: u32,
    ) -> Result<Value, UpstreamError>;

    async fn get_playlist(
        &self,
        access_token: &str,
        playlist_id: &str,
    ) -> Result<Value, UpstreamError>;

    async fn get_playlist_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
    ) -> Result<Value, UpstreamError>;
}

pub struct SpotifyClient {
    client: reqwest::Client,
    accounts_base_url: String,
    api_base_url: String,
    client_id: String,
    client_secret: String,
}

impl SpotifyClient {
    pub fn new(
        accounts_base_url: String,
        api_base_url: String,
        client_id: String,
        client_secret: String,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SEC))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            accounts_base_url: accounts_base_url.trim_end_matches('/').to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
        }
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, UpstreamError> {
        let url = format!("{}/api/token", self.accounts_base_url);
        let response = self.client.post(&url).form(form).send().await?;
        Self::parse_json(response).await
    }

    async fn api_get(
        &self,
        access_token: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, UpstreamError> {
        let url = format!("{}{}", self.api_base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await?;
        Self::parse_json(response).await
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, UpstreamError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::ErrorResponse {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .await
            .map_err(|err| UpstreamError::NoResponse(err.to_string()))
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, UpstreamError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ])
        .await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, UpstreamError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ])
        .await
    }

    async fn search_playlists(
        &self,
        access_token: &str,
        query: &str,
        limit: u32,
    ) -> Result<Value, UpstreamError> {
        let limit = limit.to_string();
        self.api_get(
            access_token,
            "/v1/search",
            &[
                ("q", query),
                ("type", "playlist"),
                ("limit", &limit),
                ("market", "DE"),
            ],
        )
        .await
    }

    async fn get_playlist(
        &self,
        access_token: &str,
        playlist_id: &str,
    ) -> Result<Value, UpstreamError> {
        self.api_get(access_token, &format!("/v1/playlists/{}", playlist_id), &[])
            .await
    }

    async fn get_playlist_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
    ) -> Result<Value, UpstreamError> {
        self.api_get(
            access_token,
            &format!("/v1/playlists/{}/tracks", playlist_id),
            &[],
        )
        .await
    }
}
