//! Authentication-related models

use crate::auth::role::Role;
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Admin login request (lookup by email)
#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: Secret<String>,
}

/// User login request (lookup by mobile)
#[derive(Debug, Deserialize)]
pub struct UserLoginRequest {
    #[serde(alias = "number")]
    pub mobile: String,
    pub password: Secret<String>,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub role: Role,
    pub token: String,
    /// seconds until the token expires
    pub expires_in: i64,
}
