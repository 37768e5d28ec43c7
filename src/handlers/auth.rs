//! 认证相关的 HTTP 处理器

use crate::{
    auth::{middleware::AuthContext, role::Role},
    error::AppError,
    middleware::AppState,
    models::{account::*, auth::*},
    services::{Registration, ADMIN_LOGIN, USER_LOGIN},
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

/// 管理员登录（邮箱）
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state
        .auth_service
        .login(ADMIN_LOGIN, &req.email, &req.password)
        .await?;

    Ok(Json(response))
}

/// 用户登录（手机号）
pub async fn user_login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UserLoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state
        .auth_service
        .login(USER_LOGIN, &req.mobile, &req.password)
        .await?;

    Ok(Json(response))
}

/// 注册管理员，仅在开放注册时可匿名调用
pub async fn register_admin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterAdminRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !state.config.security.open_admin_registration {
        tracing::warn!("Admin self-registration attempted while disabled");
        return Err(AppError::Forbidden);
    }

    req.validate()?;

    let account = state
        .auth_service
        .register(Registration {
            role: Role::Admin,
            name: req.name,
            email: req.email,
            mobile: None,
            password: req.password,
            profile: UserProfile::default(),
        })
        .await?;

    Ok(Json(json!({
        "message": "Admin registered",
        "account": AccountResponse::from(account)
    })))
}

/// 注册普通用户（自助注册与员工代注册共用）
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let account = state
        .auth_service
        .register(Registration {
            role: Role::User,
            name: req.name,
            email: req.email,
            mobile: Some(req.mobile),
            password: req.password,
            profile: req.profile,
        })
        .await?;

    Ok(Json(json!({
        "message": "User registered successfully",
        "account": AccountResponse::from(account)
    })))
}

/// 校验令牌并返回当前身份
pub async fn check_token(auth_context: AuthContext) -> Result<impl IntoResponse, AppError> {
    Ok(Json(auth_context))
}
