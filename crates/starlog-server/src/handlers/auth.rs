//! Authentication handlers
//!
//! The smallest token-issuing surface that lets every other authenticated
//! route receive a verified identity instead of a hardcoded user id.

use crate::error::ApiError;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    id: i64,
    email: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    if !req.email.contains('@') {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }
    if req.password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    // Pre-check for a friendly message; the UNIQUE column is the backstop
    if state.db.get_user_by_email(&req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let (user_id, tokens) = state
        .auth_service
        .register(&req.email, &req.password)
        .await
        .map_err(ApiError::Internal)?;

    info!("Registered user {} ({})", user_id, req.email);

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            user: UserInfo {
                id: user_id,
                email: req.email,
            },
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let (user_id, tokens) = state
        .auth_service
        .login(&req.email, &req.password)
        .await
        .map_err(|e| {
            info!("Login failed for {}: {}", req.email, e);
            ApiError::Unauthorized("Invalid email or password".to_string())
        })?;

    info!("Login successful for {}", req.email);

    Ok(Json(TokenResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: UserInfo {
            id: user_id,
            email: req.email,
        },
    }))
}
