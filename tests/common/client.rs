//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use silentmoon_server::spotify::{HEADER_REFRESH_TOKEN, HEADER_TOKEN_EXPIRATION};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows.
    /// For most tests, use `authenticated()` instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client with a fresh registered user, already logged in.
    /// Returns the client and the new user's id.
    ///
    /// # Panics
    ///
    /// Panics if signup or login fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> (Self, usize) {
        Self::authenticated_as(base_url, TEST_USER_NAME, TEST_USER_EMAIL, TEST_USER_PASS).await
    }

    /// Like `authenticated()` but with explicit credentials, for tests that
    /// need more than one user.
    pub async fn authenticated_as(
        base_url: String,
        name: &str,
        email: &str,
        password: &str,
    ) -> (Self, usize) {
        let client = Self::new(base_url);

        let response = client.signup(name, email, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Test user signup failed: {:?}",
            response.text().await
        );

        let response = client.login(email, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Test user login failed: {:?}",
            response.text().await
        );
        let body: serde_json::Value = response.json().await.expect("Login body was not JSON");
        let user_id = body["id"].as_u64().expect("Login body had no user id") as usize;

        (client, user_id)
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /api/
    pub async fn welcome(&self) -> Response {
        self.client
            .post(format!("{}/api/", self.base_url))
            .send()
            .await
            .expect("Welcome request failed")
    }

    /// POST /api/signup
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/api/signup", self.base_url))
            .json(&json!({
                "name": name,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Signup request failed")
    }

    /// POST /api/login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/api/login", self.base_url))
            .json(&json!({
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// POST /api/logout
    pub async fn logout(&self) -> Response {
        self.client
            .post(format!("{}/api/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /api/protected
    pub async fn protected(&self) -> Response {
        self.client
            .get(format!("{}/api/protected", self.base_url))
            .send()
            .await
            .expect("Protected request failed")
    }

    // ========================================================================
    // Content Endpoints
    // ========================================================================

    /// GET /api/yoga
    pub async fn yoga(&self) -> Response {
        self.client
            .get(format!("{}/api/yoga", self.base_url))
            .send()
            .await
            .expect("Yoga request failed")
    }

    /// GET /api/meditation
    pub async fn meditation(&self) -> Response {
        self.client
            .get(format!("{}/api/meditation", self.base_url))
            .send()
            .await
            .expect("Meditation request failed")
    }

    // ========================================================================
    // Settings Endpoints
    // ========================================================================

    /// GET /api/settings
    pub async fn get_settings(&self) -> Response {
        self.client
            .get(format!("{}/api/settings", self.base_url))
            .send()
            .await
            .expect("Get settings request failed")
    }

    /// POST /api/settings
    pub async fn create_settings(&self, time: &str, days: Vec<u8>) -> Response {
        self.client
            .post(format!("{}/api/settings", self.base_url))
            .json(&json!({ "time": time, "days": days }))
            .send()
            .await
            .expect("Create settings request failed")
    }

    /// PUT /api/settings
    pub async fn update_settings(&self, time: &str, days: Vec<u8>) -> Response {
        self.client
            .put(format!("{}/api/settings", self.base_url))
            .json(&json!({ "time": time, "days": days }))
            .send()
            .await
            .expect("Update settings request failed")
    }

    // ========================================================================
    // Favorites Endpoints
    // ========================================================================

    /// POST /api/favorites/{kind}/add
    pub async fn add_favorite(&self, kind: &str, user_id: usize, content_id: &str) -> Response {
        self.client
            .post(format!("{}/api/favorites/{}/add", self.base_url, kind))
            .json(&json!({
                "userId": user_id.to_string(),
                "contentId": content_id
            }))
            .send()
            .await
            .expect("Add favorite request failed")
    }

    /// POST /api/favorites/{kind}/remove
    pub async fn remove_favorite(&self, kind: &str, user_id: usize, content_id: &str) -> Response {
        self.client
            .post(format!("{}/api/favorites/{}/remove", self.base_url, kind))
            .json(&json!({
                "userId": user_id.to_string(),
                "contentId": content_id
            }))
            .send()
            .await
            .expect("Remove favorite request failed")
    }

    /// GET /api/favoritevideos?userId={}&contentId={}
    pub async fn favorite_video_status(&self, user_id: usize, content_id: &str) -> Response {
        self.client
            .get(format!("{}/api/favoritevideos", self.base_url))
            .query(&[
                ("userId", user_id.to_string().as_str()),
                ("contentId", content_id),
            ])
            .send()
            .await
            .expect("Favorite video status request failed")
    }

    /// GET /api/favorites
    pub async fn get_favorite_videos(&self) -> Response {
        self.client
            .get(format!("{}/api/favorites", self.base_url))
            .send()
            .await
            .expect("Get favorite videos request failed")
    }

    // ========================================================================
    // Spotify Endpoints
    // ========================================================================

    /// POST /api/spotify/token
    pub async fn spotify_token(&self, code: Option<&str>, redirect_uri: Option<&str>) -> Response {
        let mut body = serde_json::Map::new();
        if let Some(code) = code {
            body.insert("code".to_string(), json!(code));
        }
        if let Some(uri) = redirect_uri {
            body.insert("redirectUri".to_string(), json!(uri));
        }
        self.client
            .post(format!("{}/api/spotify/token", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Spotify token request failed")
    }

    /// GET /api/spotify/playlists with a live access token
    pub async fn spotify_playlists(&self, access_token: &str, query: Option<&str>) -> Response {
        let mut request = self
            .client
            .get(format!("{}/api/spotify/playlists", self.base_url))
            .bearer_auth(access_token);
        if let Some(q) = query {
            request = request.query(&[("q", q)]);
        }
        request.send().await.expect("Spotify playlists request failed")
    }

    /// GET /api/spotify/playlists with expiry and refresh headers set
    pub async fn spotify_playlists_with_refresh(
        &self,
        access_token: &str,
        expires_at_ms: i64,
        refresh_token: Option<&str>,
    ) -> Response {
        let mut request = self
            .client
            .get(format!("{}/api/spotify/playlists", self.base_url))
            .bearer_auth(access_token)
            .header(HEADER_TOKEN_EXPIRATION, expires_at_ms.to_string());
        if let Some(token) = refresh_token {
            request = request.header(HEADER_REFRESH_TOKEN, token);
        }
        request.send().await.expect("Spotify playlists request failed")
    }

    /// GET /api/spotify/playlists/{id}/tracks
    pub async fn spotify_playlist_tracks(
        &self,
        access_token: Option<&str>,
        playlist_id: &str,
    ) -> Response {
        let mut request = self.client.get(format!(
            "{}/api/spotify/playlists/{}/tracks",
            self.base_url, playlist_id
        ));
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }
        request
            .send()
            .await
            .expect("Spotify playlist tracks request failed")
    }

    /// POST /api/user/spotify-favorites/add
    pub async fn add_spotify_favorite(&self, user_id: usize, playlist_id: &str) -> Response {
        self.client
            .post(format!("{}/api/user/spotify-favorites/add", self.base_url))
            .json(&json!({
                "userId": user_id.to_string(),
                "playlistId": playlist_id
            }))
            .send()
            .await
            .expect("Add spotify favorite request failed")
    }

    /// POST /api/user/spotify-favorites/remove
    pub async fn remove_spotify_favorite(&self, user_id: usize, playlist_id: &str) -> Response {
        self.client
            .post(format!(
                "{}/api/user/spotify-favorites/remove",
                self.base_url
            ))
            .json(&json!({
                "userId": user_id.to_string(),
                "playlistId": playlist_id
            }))
            .send()
            .await
            .expect("Remove spotify favorite request failed")
    }

    /// GET /api/user/spotify-favorites/status?userId={}&playlistId={}
    pub async fn spotify_favorite_status(&self, user_id: usize, playlist_id: &str) -> Response {
        self.client
            .get(format!(
                "{}/api/user/spotify-favorites/status",
                self.base_url
            ))
            .query(&[
                ("userId", user_id.to_string().as_str()),
                ("playlistId", playlist_id),
            ])
            .send()
            .await
            .expect("Spotify favorite status request failed")
    }

    /// GET /api/user/spotify-favorites/details
    pub async fn spotify_favorite_details(&self, access_token: &str, user_id: usize) -> Response {
        self.client
            .get(format!(
                "{}/api/user/spotify-favorites/details",
                self.base_url
            ))
            .bearer_auth(access_token)
            .query(&[("userId", user_id.to_string())])
            .send()
            .await
            .expect("Spotify favorite details request failed")
    }

    /// GET /api/playlists/meditation/random-audio
    pub async fn random_meditation_audio(&self, access_token: &str) -> Response {
        self.client
            .get(format!(
                "{}/api/playlists/meditation/random-audio",
                self.base_url
            ))
            .bearer_auth(access_token)
            .send()
            .await
            .expect("Random meditation audio request failed")
    }

    // ========================================================================
    // Health Check / System Endpoints
    // ========================================================================

    /// GET /
    pub async fn get_stats(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Get stats request failed")
    }
}
