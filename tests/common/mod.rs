//! 测试公共模块
//! 提供测试辅助函数和测试工具

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use http_body_util::BodyExt;
use member_portal::{
    auth::{password::PasswordHasher, Role},
    config::{AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig},
    middleware::AppState,
    models::account::{Account, NewAccount, UserProfile},
    repository::{AccountRepository, InMemoryAccountRepository},
    routes,
};
use secrecy::Secret;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";
pub const TEST_PASSWORD: &str = "TestPass123";

/// 创建测试配置（低开销哈希参数）
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            graceful_shutdown_timeout_secs: 5,
        },
        database: DatabaseConfig {
            url: None,
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new(TEST_SECRET.to_string()),
            token_ttl: "1h".to_string(),
            password_hash_cost: 1,
            password_hash_memory_kib: 1024,
            password_hash_parallelism: 1,
            password_min_length: 8,
            open_admin_registration: false,
        },
    }
}

/// 测试应用：状态、账户存储与路由
pub struct TestApp {
    pub state: Arc<AppState>,
    pub accounts: Arc<InMemoryAccountRepository>,
    pub router: Router,
}

/// 创建基于内存存储的测试应用
pub fn create_test_app() -> TestApp {
    create_test_app_with(create_test_config())
}

pub fn create_test_app_with(config: AppConfig) -> TestApp {
    let accounts = Arc::new(InMemoryAccountRepository::new());
    let state = Arc::new(
        AppState::new(config, accounts.clone()).expect("Failed to create test app state"),
    );
    let router = routes::create_router(state.clone());

    TestApp {
        state,
        accounts,
        router,
    }
}

impl TestApp {
    /// 直接写入账户（用于准备教师等无法通过接口创建的角色）
    pub async fn seed_account(
        &self,
        role: Role,
        email: &str,
        mobile: Option<&str>,
    ) -> Account {
        let security = &self.state.config.security;
        let hasher = PasswordHasher::from_config(security).expect("Failed to create hasher");
        let password_hash = hasher
            .hash(TEST_PASSWORD, security.password_hash_cost)
            .expect("Failed to hash test password");

        self.accounts
            .insert(NewAccount {
                role,
                name: format!("Test {}", role),
                email: email.to_string(),
                mobile: mobile.map(str::to_string),
                password_hash,
                profile: UserProfile::default(),
            })
            .await
            .expect("Failed to seed account")
    }

    /// 为账户签发令牌
    pub fn token_for(&self, account: &Account) -> String {
        self.state
            .jwt_service
            .issue(&member_portal::auth::IssueClaims::new(
                account.id.to_string(),
                account.role,
                account.email.clone(),
            ))
            .expect("Failed to issue test token")
    }

    /// 发送请求
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible")
    }
}

/// 读取响应体为 JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}
