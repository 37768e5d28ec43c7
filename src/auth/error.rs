//! Authentication error taxonomy
//!
//! Token failures are distinguished here for logging; `AppError` collapses
//! them into a single 401 for the client.

use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("hashing failed: {0}")]
    Hashing(String),

    #[error("invalid claims: {0}")]
    InvalidClaims(String),

    #[error("malformed token")]
    MalformedToken,

    #[error("token signature invalid")]
    SignatureInvalid,

    #[error("token expired")]
    ExpiredToken,
}

impl AuthError {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Hashing(_) => "hashing",
            AuthError::InvalidClaims(_) => "invalid_claims",
            AuthError::MalformedToken => "malformed",
            AuthError::SignatureInvalid => "signature",
            AuthError::ExpiredToken => "expired",
        }
    }
}

/// Terminal state of the access control gate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("invalid credential: {0}")]
    InvalidCredential(AuthError),

    #[error("role not permitted")]
    Forbidden,
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::MissingCredential => "missing_credential",
            Rejection::InvalidCredential(_) => "invalid_credential",
            Rejection::Forbidden => "forbidden",
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Hashing(msg) => AppError::BadRequest(msg),
            AuthError::InvalidClaims(msg) => AppError::Internal(format!("Token issuance: {}", msg)),
            AuthError::MalformedToken | AuthError::SignatureInvalid | AuthError::ExpiredToken => {
                AppError::Unauthorized
            }
        }
    }
}

impl From<Rejection> for AppError {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::MissingCredential | Rejection::InvalidCredential(_) => AppError::Unauthorized,
            Rejection::Forbidden => AppError::Forbidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_failures_collapse_to_same_response() {
        let messages: Vec<(u16, String)> = [
            AuthError::MalformedToken,
            AuthError::SignatureInvalid,
            AuthError::ExpiredToken,
        ]
        .into_iter()
        .map(|e| {
            let app: AppError = Rejection::InvalidCredential(e).into();
            (app.code(), app.user_message())
        })
        .collect();

        assert!(messages.iter().all(|m| m == &messages[0]));
        assert_eq!(messages[0].0, 401);

        let missing: AppError = Rejection::MissingCredential.into();
        assert_eq!((missing.code(), missing.user_message()), messages[0]);
    }

    #[test]
    fn test_forbidden_is_distinct() {
        let app: AppError = Rejection::Forbidden.into();
        assert_eq!(app.code(), 403);
    }

    #[test]
    fn test_issuance_errors_status() {
        let hashing: AppError = AuthError::Hashing("empty secret".to_string()).into();
        assert_eq!(hashing.code(), 400);

        let claims: AppError = AuthError::InvalidClaims("empty subject".to_string()).into();
        assert_eq!(claims.code(), 500);
    }
}
