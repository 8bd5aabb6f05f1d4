//! API error taxonomy
//!
//! Every handler failure is converted locally into one of these variants
//! and serialized straight into the response; nothing propagates to a
//! process-level handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A referenced id does not exist: user, person, planet, or favorite.
    #[error("{0}")]
    NotFound(String),

    /// Missing or empty required payload or fields.
    #[error("{0}")]
    Validation(String),

    /// The record already exists. Responds 400 with a `message` body
    /// rather than 409.
    #[error("{0}")]
    Conflict(String),

    /// Missing, malformed, or stale bearer credentials.
    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, json!({ "message": msg })),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            ApiError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
