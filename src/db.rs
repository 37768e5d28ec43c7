//! 账户数据库
//! 连接池、内嵌迁移与就绪检查

use crate::config::DatabaseConfig;
use secrecy::ExposeSecret;
use sqlx::{migrate::MigrateError, postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// 就绪检查的超时时间
const PING_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database.url is not set (use --in-memory to run without a database)")]
    MissingUrl,

    #[error("connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[source] MigrateError),
}

/// 连接数据库并执行迁移
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DbError> {
    let url = config.url.as_ref().ok_or(DbError::MissingUrl)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(url.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to account database");
            DbError::Connect(e)
        })?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Account database pool ready"
    );

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        tracing::error!(error = %e, "Account schema migration failed");
        DbError::Migrate(e)
    })?;

    tracing::info!("Account schema up to date");
    Ok(())
}

/// `SELECT 1`，超时视为不健康
pub async fn health_check(pool: &PgPool) -> HealthStatus {
    let ping = sqlx::query("SELECT 1").execute(pool);

    match tokio::time::timeout(PING_TIMEOUT, ping).await {
        Ok(Ok(_)) => HealthStatus::Healthy,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Account database ping failed");
            HealthStatus::Unhealthy(e.to_string())
        }
        Err(_) => {
            tracing::warn!("Account database ping timed out");
            HealthStatus::Unhealthy("ping timed out".to_string())
        }
    }
}

/// 存储健康状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}
