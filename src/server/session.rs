use super::state::ServerState;
use crate::user::auth::verify_session_token;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::debug;

#[derive(Debug)]
pub struct Session {
    pub user_id: usize,
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

pub enum SessionExtractionError {
    /// No token anywhere in the request.
    MissingToken,
    /// A token was presented but did not verify (bad signature or expired).
    InvalidToken,
    InternalError,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        match self {
            SessionExtractionError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "No token provided").into_response()
            }
            SessionExtractionError::InvalidToken => {
                (StatusCode::FORBIDDEN, "Invalid token").into_response()
            }
            SessionExtractionError::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

async fn extract_session_token_from_cookies(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Result<Option<String>, SessionExtractionError> {
    let jar = CookieJar::from_request_parts(parts, &ctx)
        .await
        .map_err(|_| SessionExtractionError::InternalError)?;
    Ok(jar
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .map(|s| s.to_string()))
}

fn extract_session_token_from_headers(parts: &mut Parts) -> Option<String> {
    parts
        .headers
        .get(HEADER_SESSION_TOKEN_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).to_string())
}

async fn extract_session_from_request_parts(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Result<Session, SessionExtractionError> {
    let token = match extract_session_token_from_cookies(parts, ctx)
        .await?
        .or_else(|| extract_session_token_from_headers(parts))
    {
        None => {
            debug!("No token in cookies nor headers.");
            return Err(SessionExtractionError::MissingToken);
        }
        Some(x) => x,
    };

    match verify_session_token(&ctx.config.jwt_secret, &token) {
        Ok(user_id) => {
            debug!("Verified session token for user_id={}", user_id);
            Ok(Session { user_id })
        }
        Err(err) => {
            debug!("Session token rejected: {}", err);
            Err(SessionExtractionError::InvalidToken)
        }
    }
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts, ctx).await
    }
}

impl OptionalFromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(extract_session_from_request_parts(parts, ctx).await.ok())
    }
}
