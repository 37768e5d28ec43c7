//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use crate::auth::{jwt::MIN_SECRET_LEN, password::MAX_HASH_COST};
use crate::error::AppError;
use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接 URL（使用 Secret 包装，防止日志泄露）
    /// 仅内存模式下可以缺省
    pub url: Option<Secret<String>>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// JWT 密钥（使用 Secret 包装，防止日志泄露），没有默认值
    pub jwt_secret: Secret<String>,
    /// 令牌有效期，例如 "3600"、"900s"、"15m"、"1h"、"7d"
    pub token_ttl: String,
    /// Argon2 迭代次数
    pub password_hash_cost: u32,
    /// Argon2 内存开销（KiB）
    pub password_hash_memory_kib: u32,
    /// Argon2 并行度
    pub password_hash_parallelism: u32,
    /// 密码最小长度
    pub password_min_length: usize,
    /// 是否允许匿名注册管理员
    pub open_admin_registration: bool,
}

impl SecurityConfig {
    /// 解析令牌有效期
    pub fn token_ttl(&self) -> Result<chrono::Duration, AppError> {
        parse_duration(&self.token_ttl)
            .ok_or_else(|| AppError::Config(format!("Invalid token_ttl: {}", self.token_ttl)))
    }
}

const MIN_TOKEN_TTL_SECS: i64 = 60;
const MAX_TOKEN_TTL_SECS: i64 = 30 * 86_400;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

/// 解析时长字符串：纯数字视为秒，支持 s/m/h/d 后缀
pub fn parse_duration(input: &str) -> Option<chrono::Duration> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);

    let value: i64 = digits.parse().ok()?;
    let seconds = match unit.trim() {
        "" | "s" => value,
        "m" => value.checked_mul(60)?,
        "h" => value.checked_mul(3600)?,
        "d" => value.checked_mul(86400)?,
        _ => return None,
    };

    chrono::Duration::try_seconds(seconds)
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置（jwt_secret 必须由环境提供，database.url 仅内存模式可缺省）
        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.token_ttl", "1h")?
            .set_default("security.password_hash_cost", 3)?
            .set_default("security.password_hash_memory_kib", 65536)?
            .set_default("security.password_hash_parallelism", 4)?
            .set_default("security.password_min_length", 8)?
            .set_default("security.open_admin_registration", false)?;

        // 从环境变量加载配置（前缀为 PORTAL_）
        settings = settings.add_source(
            Environment::with_prefix("PORTAL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logging.validate()?;
        self.database.validate()?;
        self.security.validate()?;
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Message(msg.into())
}

impl ServerConfig {
    /// 端口 0 表示随机端口，其余必须是非特权端口
    fn validate(&self) -> Result<(), ConfigError> {
        let port = self
            .addr
            .rsplit_once(':')
            .and_then(|(_, port)| port.parse::<u16>().ok())
            .ok_or_else(|| invalid(format!("Invalid server.addr: {}", self.addr)))?;

        if port != 0 && port < 1024 {
            return Err(invalid("Server port should be >= 1024"));
        }
        Ok(())
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        const FORMATS: [&str; 2] = ["json", "pretty"];

        if !LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(invalid(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.level,
                LEVELS.join(", ")
            )));
        }
        if !FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(invalid(format!(
                "Invalid log format: {}. Must be one of: {}",
                self.format,
                FORMATS.join(", ")
            )));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections < self.min_connections {
            return Err(invalid("max_connections must be >= min_connections"));
        }
        Ok(())
    }
}

impl SecurityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.expose_secret().len() < MIN_SECRET_LEN {
            return Err(invalid(format!(
                "JWT secret must be at least {} bytes long",
                MIN_SECRET_LEN
            )));
        }

        let ttl = parse_duration(&self.token_ttl)
            .ok_or_else(|| invalid(format!("Invalid token_ttl: {}", self.token_ttl)))?;
        if !(MIN_TOKEN_TTL_SECS..=MAX_TOKEN_TTL_SECS).contains(&ttl.num_seconds()) {
            return Err(invalid("token_ttl must be between 60 seconds and 30 days"));
        }

        if !(1..=MAX_HASH_COST).contains(&self.password_hash_cost) {
            return Err(invalid(format!(
                "password_hash_cost must be between 1 and {}",
                MAX_HASH_COST
            )));
        }

        if !(6..=128).contains(&self.password_min_length) {
            return Err(invalid("password_min_length must be between 6 and 128"));
        }
        Ok(())
    }
}
