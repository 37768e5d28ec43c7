//! Account repository (数据库访问层)

use crate::{
    auth::role::Role,
    db::{self, HealthStatus},
    error::AppError,
    models::account::*,
};
use async_trait::async_trait;
use sqlx::{postgres::PgArguments, query::QueryAs, PgPool, Postgres};
use uuid::Uuid;

/// Persistence seam for accounts.
///
/// The authentication core only needs the lookups; the remaining methods back
/// the account management endpoints.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<Account>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    /// Accounts with the given role, newest first
    async fn list_by_role(&self, role: Role) -> Result<Vec<Account>, AppError>;

    async fn insert(&self, account: NewAccount) -> Result<Account, AppError> {
        let query = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (
                id, role, name, email, mobile, password_hash,
                age, dob, user_cast, father_mobile, native_place,
                current_place, address, marital_status, occupation, education
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account.role.as_str())
        .bind(account.name)
        .bind(account.email)
        .bind(account.mobile)
        .bind(account.password_hash);

        let row = bind_profile(query, &account.profile)
            .fetch_one(&self.db)
            .await
            .map_err(map_unique_violation)?;

        to_account(row)
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateAccountRequest,
    ) -> Result<Option<Account>, AppError> {
        let query = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET
                name = $2,
                email = $3,
                mobile = COALESCE($4, mobile),
                age = $5,
                dob = $6,
                user_cast = $7,
                father_mobile = $8,
                native_place = $9,
                current_place = $10,
                address = $11,
                marital_status = $12,
                occupation = $13,
                education = $14,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.name.clone())
        .bind(req.email.clone())
        .bind(req.mobile.clone());

        let row = bind_profile(query, &req.profile)
            .fetch_optional(&self.db)
            .await
            .map_err(map_unique_violation)?;

        row.map(to_account).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;

    async fn ping(&self) -> HealthStatus;
}

pub struct PgAccountRepository {
    db: PgPool,
}

impl PgAccountRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn fetch_one_by(
        &self,
        sql: &'static str,
        value: &str,
    ) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;

        row.map(to_account).transpose()
    }
}

fn to_account(row: AccountRow) -> Result<Account, AppError> {
    let id = row.id;
    Account::try_from(row).map_err(|e| {
        tracing::error!(account_id = %id, "Stored account has an invalid role: {}", e);
        AppError::Internal(e.to_string())
    })
}

type AccountQuery<'q> = QueryAs<'q, Postgres, AccountRow, PgArguments>;

/// 按列顺序绑定资料字段：age, dob, user_cast, father_mobile, native_place,
/// current_place, address, marital_status, occupation, education
fn bind_profile<'q>(query: AccountQuery<'q>, profile: &UserProfile) -> AccountQuery<'q> {
    query
        .bind(profile.age)
        .bind(profile.dob)
        .bind(profile.user_cast.clone())
        .bind(profile.father_mobile.clone())
        .bind(profile.native_place.clone())
        .bind(profile.current_place.clone())
        .bind(profile.address.clone())
        .bind(profile.marital_status)
        .bind(profile.occupation.clone())
        .bind(profile.education.clone())
}

/// 唯一约束冲突转换为 409
fn map_unique_violation(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Account with this email or mobile already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    /// 根据邮箱查找（不区分大小写）
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        self.fetch_one_by(
            "SELECT * FROM accounts WHERE LOWER(email) = LOWER($1) LIMIT 1",
            email,
        )
        .await
    }

    /// 根据手机号查找
    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<Account>, AppError> {
        self.fetch_one_by("SELECT * FROM accounts WHERE mobile = $1 LIMIT 1", mobile)
            .await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        row.map(to_account).transpose()
    }

    async fn list_by_role(&self, role: Role) -> Result<Vec<Account>, AppError> {
        let rows = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE role = $1 ORDER BY created_at DESC",
        )
        .bind(role.as_str())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(to_account).collect()
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (id, role, name, email, mobile, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(account.role.as_str())
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.mobile)
        .bind(&account.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique_violation)?;

        to_account(row)
    }

    async fn update(
        &self,
        id: Uuid,
        req: &UpdateAccountRequest,
    ) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET
                name = $2,
                email = $3,
                mobile = COALESCE($4, mobile),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.email)
        .bind(&req.mobile)
        .fetch_optional(&self.db)
        .await
        .map_err(map_unique_violation)?;

        row.map(to_account).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> HealthStatus {
        db::health_check(&self.db).await
    }
}
