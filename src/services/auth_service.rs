//! 认证服务：登录、注册

use crate::{
    auth::{
        jwt::{IssueClaims, JwtService},
        password::PasswordHasher,
        role::{Role, RoleSet, STAFF, USER_ONLY},
    },
    config::SecurityConfig,
    error::AppError,
    models::{account::*, auth::LoginResponse},
    repository::AccountRepository,
};
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;

/// Which identifier a login flow looks accounts up by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupBy {
    Email,
    Mobile,
}

/// A password login flow: lookup key plus the roles it may sign in
#[derive(Debug, Clone, Copy)]
pub struct LoginFlow {
    pub lookup_by: LookupBy,
    pub accepted_roles: RoleSet,
}

/// Staff sign in with their email
pub const ADMIN_LOGIN: LoginFlow = LoginFlow {
    lookup_by: LookupBy::Email,
    accepted_roles: STAFF,
};

/// End users sign in with their mobile number
pub const USER_LOGIN: LoginFlow = LoginFlow {
    lookup_by: LookupBy::Mobile,
    accepted_roles: USER_ONLY,
};

/// Plaintext registration input; only its hash leaves this service
#[derive(Debug)]
pub struct Registration {
    pub role: Role,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub password: Secret<String>,
    pub profile: UserProfile,
}

pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    jwt_service: Arc<JwtService>,
    hasher: PasswordHasher,
    hash_cost: u32,
    password_min_length: usize,
    /// Verified against when the account does not exist, so unknown
    /// identifiers cost the same as wrong passwords
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        jwt_service: Arc<JwtService>,
        hasher: PasswordHasher,
        hash_cost: u32,
        password_min_length: usize,
    ) -> Result<Self, AppError> {
        let dummy_hash = hasher.hash("unknown-account-placeholder", hash_cost)?;

        Ok(Self {
            accounts,
            jwt_service,
            hasher,
            hash_cost,
            password_min_length,
            dummy_hash,
        })
    }

    pub fn from_config(
        accounts: Arc<dyn AccountRepository>,
        jwt_service: Arc<JwtService>,
        config: &SecurityConfig,
    ) -> Result<Self, AppError> {
        Self::new(
            accounts,
            jwt_service,
            PasswordHasher::from_config(config)?,
            config.password_hash_cost,
            config.password_min_length,
        )
    }

    /// 密码登录，成功后签发令牌
    pub async fn login(
        &self,
        flow: LoginFlow,
        identifier: &str,
        password: &Secret<String>,
    ) -> Result<LoginResponse, AppError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.expose_secret().is_empty() {
            return Err(AppError::BadRequest(match flow.lookup_by {
                LookupBy::Email => "Email and password are required".to_string(),
                LookupBy::Mobile => "Number and password are required".to_string(),
            }));
        }

        let account = match flow.lookup_by {
            LookupBy::Email => self.accounts.find_by_email(identifier).await?,
            LookupBy::Mobile => self.accounts.find_by_mobile(identifier).await?,
        }
        .filter(|account| flow.accepted_roles.permits(account.role));

        let stored_hash = account
            .as_ref()
            .map(|a| a.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.clone());

        let matched = self
            .verify_password(password.expose_secret().clone(), stored_hash)
            .await?;

        let account = match account {
            Some(account) if matched => account,
            _ => {
                tracing::warn!(lookup = ?flow.lookup_by, "Login failed: invalid credentials");
                metrics::counter!("auth_login_failures_total").increment(1);
                return Err(AppError::Unauthorized);
            }
        };

        let token = self.jwt_service.issue(&IssueClaims::new(
            account.id.to_string(),
            account.role,
            account.email.clone(),
        ))?;

        tracing::info!(account_id = %account.id, role = %account.role, "Login successful");

        Ok(LoginResponse {
            id: account.id,
            name: account.name,
            email: account.email,
            mobile: account.mobile,
            role: account.role,
            token,
            expires_in: self.jwt_service.ttl().num_seconds(),
        })
    }

    /// 注册账户，只持久化密码哈希
    pub async fn register(&self, registration: Registration) -> Result<Account, AppError> {
        PasswordHasher::validate_password_policy(
            registration.password.expose_secret(),
            self.password_min_length,
        )?;

        let email = registration.email.trim().to_string();
        let mobile = registration.mobile.map(|m| m.trim().to_string());

        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "Account with this email already exists".to_string(),
            ));
        }
        if let Some(mobile) = &mobile {
            if self.accounts.find_by_mobile(mobile).await?.is_some() {
                return Err(AppError::Conflict(
                    "Account with this number already exists".to_string(),
                ));
            }
        }

        let password_hash = self
            .hash_password(registration.password.expose_secret().clone())
            .await?;

        let account = self
            .accounts
            .insert(NewAccount {
                role: registration.role,
                name: registration.name.trim().to_string(),
                email,
                mobile,
                password_hash,
                profile: registration.profile.normalized(),
            })
            .await?;

        tracing::info!(account_id = %account.id, role = %account.role, "Account registered");

        Ok(account)
    }

    /// Argon2 在阻塞线程池上执行
    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        let cost = self.hash_cost;

        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password, cost)).await??;
        Ok(hash)
    }

    async fn verify_password(&self, candidate: String, stored: String) -> Result<bool, AppError> {
        let hasher = self.hasher.clone();

        let matched =
            tokio::task::spawn_blocking(move || hasher.verify(&candidate, &stored)).await?;
        Ok(matched)
    }
}
