use crate::spotify::UpstreamError;
use crate::user::UserError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Handler-level error, one variant per response class.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(msg) => ApiError::Validation(msg),
            UserError::InvalidCredentials => ApiError::Auth(err.to_string()),
            UserError::EmailTaken => ApiError::Conflict(err.to_string()),
            UserError::UnknownUser => ApiError::NotFound(err.to_string()),
            UserError::DuplicateFavorite => ApiError::Conflict(err.to_string()),
            UserError::Internal(inner) => ApiError::Internal(inner),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": msg }))).into_response()
            }
            ApiError::Auth(msg) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "message": msg }))).into_response()
            }
            ApiError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, Json(json!({ "message": msg }))).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": msg }))).into_response()
            }
            ApiError::Conflict(msg) => {
                (StatusCode::CONFLICT, Json(json!({ "message": msg }))).into_response()
            }
            ApiError::Upstream(err) => upstream_response(err),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Upstream failures all map to 500 but keep as much of the original
/// failure as is safe to pass along.
fn upstream_response(err: UpstreamError) -> Response {
    let body = match &err {
        UpstreamError::ErrorResponse { status, body } => {
            // Pass the upstream's own error payload through when it is JSON
            let detail: serde_json::Value =
                serde_json::from_str(body).unwrap_or_else(|_| json!(body));
            json!({
                "message": "Something went wrong",
                "upstreamStatus": status,
                "error": detail,
            })
        }
        UpstreamError::NoResponse(_) => {
            error!("Upstream request got no response: {}", err);
            json!({ "message": "No response from upstream service" })
        }
        UpstreamError::RequestSetup(_) => {
            error!("Upstream request setup failed: {}", err);
            json!({ "message": "Failed to reach upstream service" })
        }
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
