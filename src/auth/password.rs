//! Password hashing and verification using Argon2id

use super::error::AuthError;
use crate::{config::SecurityConfig, error::AppError};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

/// Largest accepted Argon2 iteration count
pub const MAX_HASH_COST: u32 = 10;

/// Password hasher with configurable memory and parallelism.
///
/// The work factor (`cost`, the Argon2 iteration count) is passed per call;
/// verification reads the parameters back out of the stored PHC string, so
/// hashes produced under an older cost keep verifying.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    memory_kib: u32,
    parallelism: u32,
}

impl PasswordHasher {
    /// Create hasher with default parameters (OWASP recommended)
    pub fn new() -> Self {
        // m=64MiB, p=4 lanes
        Self {
            memory_kib: 65536,
            parallelism: 4,
        }
    }

    pub fn with_params(memory_kib: u32, parallelism: u32) -> Result<Self, AuthError> {
        Params::new(memory_kib, 1, parallelism, None)
            .map_err(|e| AuthError::Hashing(format!("Invalid Argon2 params: {}", e)))?;

        Ok(Self {
            memory_kib,
            parallelism,
        })
    }

    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::with_params(config.password_hash_memory_kib, config.password_hash_parallelism)
            .map_err(|e| AppError::Config(e.to_string()))
    }

    /// Hash a secret into a salted PHC string
    pub fn hash(&self, secret: &str, cost: u32) -> Result<String, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Hashing("Password must not be empty".to_string()));
        }

        if !(1..=MAX_HASH_COST).contains(&cost) {
            return Err(AuthError::Hashing(format!(
                "Hash cost must be between 1 and {}",
                MAX_HASH_COST
            )));
        }

        let params = Params::new(self.memory_kib, cost, self.parallelism, None)
            .map_err(|e| AuthError::Hashing(format!("Invalid Argon2 params: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);

        let password_hash = argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                AuthError::Hashing(format!("Failed to hash password: {}", e))
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a candidate against a stored hash.
    ///
    /// Returns false for a wrong secret and for a stored value that is not a
    /// valid PHC string.
    pub fn verify(&self, candidate: &str, stored: &str) -> bool {
        let parsed_hash = match PasswordHash::new(stored) {
            Ok(hash) => hash,
            Err(e) => {
                tracing::debug!("Failed to parse password hash: {:?}", e);
                return false;
            }
        };

        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Validate password against policy
    pub fn validate_password_policy(password: &str, min_length: usize) -> Result<(), AppError> {
        if password.chars().count() < min_length {
            return Err(AppError::BadRequest(format!(
                "Password must be at least {} characters",
                min_length
            )));
        }

        if password.trim().is_empty() {
            return Err(AppError::BadRequest("Password must not be blank".to_string()));
        }

        Ok(())
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::with_params(1024, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let password = "TestPassword123!";

        let hash = hasher.hash(password, 1).unwrap();
        assert!(hasher.verify(password, &hash));
    }

    #[test]
    fn test_verify_fails_with_wrong_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash("TestPassword123!", 1).unwrap();
        assert!(!hasher.verify("WrongPassword", &hash));
    }

    #[test]
    fn test_verify_garbage_hash_is_false() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
        assert!(!hasher.verify("anything", ""));
    }

    #[test]
    fn test_cost_out_of_range() {
        let hasher = fast_hasher();
        assert!(matches!(hasher.hash("secret", 0), Err(AuthError::Hashing(_))));
        assert!(matches!(
            hasher.hash("secret", MAX_HASH_COST + 1),
            Err(AuthError::Hashing(_))
        ));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let hasher = fast_hasher();
        assert!(matches!(hasher.hash("", 1), Err(AuthError::Hashing(_))));
    }

    #[test]
    fn test_invalid_memory_params_rejected() {
        // Argon2 requires at least 8 KiB per lane
        assert!(PasswordHasher::with_params(8, 4).is_err());
    }

    #[test]
    fn test_password_policy_validation() {
        assert!(PasswordHasher::validate_password_policy("Test1234", 8).is_ok());
        assert!(PasswordHasher::validate_password_policy("Test1", 8).is_err());
        assert!(PasswordHasher::validate_password_policy("        ", 8).is_err());
    }
}
