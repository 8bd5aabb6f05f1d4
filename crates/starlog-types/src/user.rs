//! User types

use serde::{Deserialize, Serialize};

/// User account.
///
/// The password hash is carried for credential checks only and is skipped
/// by serialization, so no API response can ever contain it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_active: bool,
}
