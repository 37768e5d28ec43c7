//! JWT token issuance and verification
//! HS256 bearer tokens with a fixed time-to-live, verified statelessly

use super::{error::AuthError, role::Role};
use crate::{config::AppConfig, error::AppError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// Minimum HMAC key length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// JWT claims carried by every token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,

    pub role: Role,

    pub email: String,

    /// Issued at (unix seconds)
    pub iat: i64,

    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Identity claims supplied by the caller at issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueClaims {
    pub subject_id: String,
    pub role: Role,
    pub email: String,
}

impl IssueClaims {
    pub fn new(subject_id: impl Into<String>, role: Role, email: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            role,
            email: email.into(),
        }
    }

    /// Build claims from an untyped role name, failing on unknown roles
    pub fn parse(
        subject_id: impl Into<String>,
        role: &str,
        email: impl Into<String>,
    ) -> Result<Self, AuthError> {
        Ok(Self::new(subject_id, role.parse()?, email))
    }
}

impl Claims {
    /// The identity portion of the claims, without timestamps
    pub fn identity(&self) -> IssueClaims {
        IssueClaims::new(self.sub.clone(), self.role, self.email.clone())
    }
}

/// JWT service
///
/// Holds the process-wide signing key and TTL. Built once at startup and
/// shared read-only across requests.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtService {
    /// Rejects a short secret or non-positive TTL as a configuration error
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, AppError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "JWT secret too short (min {} bytes)",
                MIN_SECRET_LEN
            )));
        }

        if ttl <= Duration::zero() {
            return Err(AppError::Config("Token TTL must be positive".to_string()));
        }

        // Expiry is checked by `verify_at` against the caller's clock
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();
        let ttl = config.security.token_ttl()?;

        Self::new(secret.as_bytes(), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a signed token for the given identity
    pub fn issue(&self, claims: &IssueClaims) -> Result<String, AuthError> {
        self.issue_at(claims, Utc::now())
    }

    pub fn issue_at(&self, claims: &IssueClaims, now: DateTime<Utc>) -> Result<String, AuthError> {
        if claims.subject_id.trim().is_empty() {
            return Err(AuthError::InvalidClaims("subject id must not be empty".to_string()));
        }

        let expiration = now + self.ttl;

        let claims = Claims {
            sub: claims.subject_id.clone(),
            role: claims.role,
            email: claims.email.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {:?}", e);
            AuthError::InvalidClaims(format!("Failed to encode token: {}", e))
        })
    }

    /// Validate and decode token
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                match e.kind() {
                    ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
                    ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                    _ => AuthError::MalformedToken,
                }
            })?
            .claims;

        if now.timestamp() >= claims.exp {
            tracing::debug!(exp = claims.exp, now = now.timestamp(), "Token expired");
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }
}
