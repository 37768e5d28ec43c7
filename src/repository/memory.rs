//! In-process account store, for tests and `--in-memory` runs

use super::account_repo::AccountRepository;
use crate::{
    auth::role::Role,
    db::HealthStatus,
    error::AppError,
    models::account::*,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// 与 Postgres `LOWER()` 一致的大小写折叠
fn same_email(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn conflicts(existing: &Account, email: &str, mobile: Option<&str>) -> bool {
    same_email(&existing.email, email)
        || (mobile.is_some() && existing.mobile.as_deref() == mobile)
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| same_email(&a.email, email))
            .cloned())
    }

    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<Account>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|a| a.mobile.as_deref() == Some(mobile))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Account>, AppError> {
        let accounts = self.accounts.read().await;
        let mut listed: Vec<Account> = accounts
            .values()
            .filter(|a| a.role == role)
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, AppError> {
        let mut accounts = self.accounts.write().await;

        if accounts
            .values()
            .any(|a| conflicts(a, &account.email, account.mobile.as_deref()))
        {
            return Err(AppError::Conflict(
                "Account with this email or mobile already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let stored = Account {
            id: Uuid::new_v4(),
            role: account.role,
            name: account.name,
            email: account.email,
            mobile: account.mobile,
            password_hash: account.password_hash,
            profile: account.profile,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateAccountRequest,
    ) -> Result<Option<Account>, AppError> {
        let mut accounts = self.accounts.write().await;

        if accounts
            .values()
            .any(|a| a.id != id && conflicts(a, &req.email, req.mobile.as_deref()))
        {
            return Err(AppError::Conflict(
                "Account with this email or mobile already exists".to_string(),
            ));
        }

        let Some(account) = accounts.get_mut(&id) else {
            return Ok(None);
        };

        account.name = req.name.clone();
        account.email = req.email.clone();
        if let Some(mobile) = &req.mobile {
            account.mobile = Some(mobile.clone());
        }
        account.profile = req.profile.clone();
        account.updated_at = Utc::now();

        Ok(Some(account.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.accounts.write().await.remove(&id).is_some())
    }

    async fn ping(&self) -> HealthStatus {
        HealthStatus::Healthy
    }
}
