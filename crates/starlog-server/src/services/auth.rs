//! Authentication service
//!
//! Issues and validates the bearer tokens that stand in for a logged-in
//! session. Passwords are stored as argon2 hashes and verified here only;
//! the hash never leaves this module except into the store.

use crate::storage::Database;
use anyhow::Result;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const ACCESS_TOKEN_DAYS: i64 = 7;
const REFRESH_TOKEN_DAYS: i64 = 30;

pub struct AuthService {
    db: Arc<Database>,
    jwt_secret: String,
}

impl AuthService {
    pub fn new(db: Arc<Database>, jwt_secret: String) -> Self {
        Self { db, jwt_secret }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<(i64, AuthTokens)> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();

        let user_id = self.db.create_user(email, &password_hash).await?;
        let tokens = self.generate_tokens(user_id)?;

        Ok((user_id, tokens))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(i64, AuthTokens)> {
        if let Some(user) = self.db.get_user_by_email(email).await? {
            let parsed_hash = PasswordHash::new(&user.password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;

            if Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok()
            {
                if !user.is_active {
                    anyhow::bail!("Account is disabled");
                }
                let tokens = self.generate_tokens(user.id)?;
                return Ok((user.id, tokens));
            }
        }

        anyhow::bail!("Invalid credentials")
    }

    pub async fn validate_token(&self, token: &str) -> Result<i64> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )?;

        Ok(token_data.claims.sub.parse()?)
    }

    fn generate_tokens(&self, user_id: i64) -> Result<AuthTokens> {
        let now = Utc::now();

        let access_exp = now + Duration::days(ACCESS_TOKEN_DAYS);
        let access_claims = Claims {
            sub: user_id.to_string(),
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
            token_type: "access".to_string(),
        };
        let access_token = encode(
            &Header::default(),
            &access_claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        let refresh_exp = now + Duration::days(REFRESH_TOKEN_DAYS);
        let refresh_claims = Claims {
            sub: user_id.to_string(),
            exp: refresh_exp.timestamp(),
            iat: now.timestamp(),
            token_type: "refresh".to_string(),
        };
        let refresh_token = encode(
            &Header::default(),
            &refresh_claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            expires_in: (access_exp - now).num_seconds(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id
    exp: i64,
    iat: i64,
    token_type: String,
}

#[derive(Debug, Clone)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_service() -> (AuthService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Arc::new(Database::new(path.to_str().unwrap()).await.unwrap());
        (AuthService::new(db, "test-secret".to_string()), dir)
    }

    #[tokio::test]
    async fn register_then_login_round_trips() {
        let (service, _dir) = test_service().await;

        let (user_id, tokens) = service
            .register("rey@jakku.net", "bb8-friend")
            .await
            .unwrap();
        assert_eq!(service.validate_token(&tokens.access_token).await.unwrap(), user_id);

        let (login_id, _) = service.login("rey@jakku.net", "bb8-friend").await.unwrap();
        assert_eq!(login_id, user_id);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let (service, _dir) = test_service().await;

        service.register("rey@jakku.net", "bb8-friend").await.unwrap();
        assert!(service.login("rey@jakku.net", "wrong").await.is_err());
        assert!(service.login("nobody@jakku.net", "bb8-friend").await.is_err());
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let (service, _dir) = test_service().await;
        assert!(service.validate_token("not-a-jwt").await.is_err());
    }
}
