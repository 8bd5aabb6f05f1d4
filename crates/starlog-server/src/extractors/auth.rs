//! Auth extractor for protected routes

use crate::error::ApiError;
use crate::AppState;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Verified user identity, injected into every handler that declares it.
///
/// Resolving this extractor is what "the acting user" means anywhere in
/// the API; no handler carries a user id of its own.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization format".to_string()))?;

        let user_id = state
            .auth_service
            .validate_token(token)
            .await
            .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

        match state.db.get_user_by_id(user_id).await? {
            Some(user) => Ok(AuthUser {
                id: user.id,
                email: user.email,
            }),
            // A valid token whose account is gone: the acting user does
            // not exist, which is a 404 on every favorites route.
            None => Err(ApiError::NotFound("User not found".to_string())),
        }
    }
}
