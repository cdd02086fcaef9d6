//! In-process Spotify stand-in for end-to-end tests
//!
//! Counts calls per operation so tests can assert on upstream traffic,
//! in particular that the refresh coalescing holds under concurrency.

use super::constants::*;
use async_trait::async_trait;
use serde_json::{json, Value};
use silentmoon_server::spotify::{SpotifyApi, TokenResponse, UpstreamError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Default)]
pub struct MockSpotify {
    pub exchange_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub playlist_calls: AtomicUsize,
    pub tracks_calls: AtomicUsize,
    /// When set, token operations answer like Spotify rejecting the grant.
    pub fail_token_requests: AtomicBool,
}

impl MockSpotify {
    fn token_failure() -> UpstreamError {
        UpstreamError::ErrorResponse {
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.to_string(),
        }
    }
}

#[async_trait]
impl SpotifyApi for MockSpotify {
    async fn exchange_code(
        &self,
        _code: &str,
        _redirect_uri: &str,
    ) -> Result<TokenResponse, UpstreamError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_token_requests.load(Ordering::SeqCst) {
            return Err(Self::token_failure());
        }
        Ok(TokenResponse {
            access_token: MOCK_ACCESS_TOKEN.to_string(),
            token_type: Some("Bearer".to_string()),
            expires_in: 3600,
            refresh_token: Some(MOCK_REFRESH_TOKEN.to_string()),
            scope: None,
        })
    }

    async fn refresh_access_token(
        &self,
        _refresh_token: &str,
    ) -> Result<TokenResponse, UpstreamError> {
        let call = self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_token_requests.load(Ordering::SeqCst) {
            return Err(Self::token_failure());
        }
        Ok(TokenResponse {
            access_token: format!("refreshed-{}", call),
            token_type: Some("Bearer".to_string()),
            expires_in: 3600,
            refresh_token: None,
            scope: None,
        })
    }

    async fn search_playlists(
        &self,
        _access_token: &str,
        query: &str,
        limit: u32,
    ) -> Result<Value, UpstreamError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "playlists": {
                "items": [
                    { "id": MOCK_PLAYLIST_1_ID, "name": "Calm Meditations" },
                    { "id": MOCK_PLAYLIST_2_ID, "name": "Sleep Sounds" },
                ],
                "limit": limit,
                "query": query,
            }
        }))
    }

    async fn get_playlist(
        &self,
        _access_token: &str,
        playlist_id: &str,
    ) -> Result<Value, UpstreamError> {
        self.playlist_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "id": playlist_id,
            "name": format!("Playlist {}", playlist_id),
        }))
    }

    async fn get_playlist_tracks(
        &self,
        _access_token: &str,
        playlist_id: &str,
    ) -> Result<Value, UpstreamError> {
        self.tracks_calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "items": [
                { "track": { "id": format!("{}-tr-1", playlist_id), "name": "Ocean Waves" } },
                { "track": { "id": format!("{}-tr-2", playlist_id), "name": "Rainfall" } },
            ]
        }))
    }
}
