//! HTTP handlers

pub mod auth;
pub mod favorites;
pub mod health;
pub mod people;
pub mod planets;
pub mod users;

pub use health::health;

use crate::error::ApiError;
use serde::Serialize;

/// `{message}` body for writes that return no entity.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `{message, id}` body for creations.
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: i64,
}

pub(crate) fn missing_data() -> ApiError {
    ApiError::Validation("Missing data".to_string())
}
