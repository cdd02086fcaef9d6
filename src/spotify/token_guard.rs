//! Access token guard for the Spotify proxy routes.
//!
//! Requests carry the access token as a bearer header and, optionally, its
//! absolute expiry and a refresh token. An expired access token is refreshed
//! transparently before the handler runs, and the replacement is handed back
//! to the client through response headers.

use super::client::{SpotifyApi, UpstreamError};
use super::models::RefreshedToken;
use crate::server::state::ServerState;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub const HEADER_REFRESH_TOKEN: &str = "x-refresh-token";
pub const HEADER_TOKEN_EXPIRATION: &str = "x-token-expiration";
pub const HEADER_NEW_ACCESS_TOKEN: &str = "x-new-access-token";

/// Collapses concurrent refreshes of the same refresh token into one
/// upstream call. Each refresh token gets a slot; whoever locks the slot
/// first performs the exchange, everyone queued behind it reuses the result
/// while it is still fresh.
#[derive(Default)]
pub struct RefreshCoalescer {
    slots: Mutex<HashMap<String, Arc<tokio::sync::Mutex<Option<RefreshedToken>>>>>,
}

impl RefreshCoalescer {
    pub async fn refresh(
        &self,
        api: &dyn SpotifyApi,
        refresh_token: &str,
    ) -> Result<RefreshedToken, UpstreamError> {
        let slot = {
            let mut slots = self.slots.lock().unwrap();
            Self::evict_stale_slots(&mut slots);
            slots
                .entry(refresh_token.to_string())
                .or_default()
                .clone()
        };

        let mut cached = slot.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at_ms > Utc::now().timestamp_millis() {
                debug!("Reusing coalesced access token");
                return Ok(token.clone());
            }
        }

        let response = api.refresh_access_token(refresh_token).await?;
        let refreshed = RefreshedToken {
            access_token: response.access_token,
            expires_at_ms: Utc::now().timestamp_millis() + response.expires_in as i64 * 1000,
        };
        *cached = Some(refreshed.clone());
        Ok(refreshed)
    }

    // The map grows with every distinct refresh token ever seen, including
    // garbage ones that fail upstream. Drop slots nobody holds whose cached
    // token is expired or was never filled in.
    fn evict_stale_slots(slots: &mut HashMap<String, Arc<tokio::sync::Mutex<Option<RefreshedToken>>>>) {
        let now = Utc::now().timestamp_millis();
        slots.retain(|_, slot| {
            // The outer lock is held, so a strong count above one means a
            // refresh through this slot is still in progress.
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(cached) => cached
                    .as_ref()
                    .is_some_and(|token| token.expires_at_ms > now),
                Err(_) => true,
            }
        });
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.lock().unwrap().len()
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response()
}

pub async fn guard_spotify_token(
    State(state): State<ServerState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let headers = request.headers();

    if bearer_token(headers).is_none() {
        return unauthorized("No access token provided");
    }

    // No expiry claim, or a zero placeholder, means nothing to check and
    // the token is taken at face value
    let expires_at_ms = match header_string(headers, HEADER_TOKEN_EXPIRATION)
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|ms| *ms > 0)
    {
        Some(ms) => ms,
        None => return next.run(request).await,
    };

    if Utc::now().timestamp_millis() < expires_at_ms {
        return next.run(request).await;
    }

    let refresh_token = match header_string(headers, HEADER_REFRESH_TOKEN) {
        Some(token) => token,
        None => return unauthorized("Access token expired and no refresh token provided"),
    };

    debug!("Access token expired, refreshing");
    let refreshed = match state
        .refresh_coalescer
        .refresh(state.spotify.as_ref(), &refresh_token)
        .await
    {
        Ok(refreshed) => refreshed,
        Err(err) => {
            warn!("Token refresh failed: {}", err);
            return unauthorized("Failed to refresh access token");
        }
    };

    let bearer = format!("Bearer {}", refreshed.access_token);
    if let Ok(value) = HeaderValue::from_str(&bearer) {
        request
            .headers_mut()
            .insert(axum::http::header::AUTHORIZATION, value);
    }

    let mut response = next.run(request).await;
    let response_headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&refreshed.access_token) {
        response_headers.insert(HEADER_NEW_ACCESS_TOKEN, value);
    }
    if let Ok(value) = HeaderValue::from_str(&refreshed.expires_at_ms.to_string()) {
        response_headers.insert(HEADER_TOKEN_EXPIRATION, value);
    }
    response
}
