//! 用户管理的 HTTP 处理器（仅管理员）

use crate::{
    auth::{middleware::AuthContext, role::Role},
    error::AppError,
    middleware::AppState,
    models::account::*,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 列出用户
pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let users = state.accounts.list_by_role(Role::User).await?;

    let user_responses: Vec<AccountResponse> = users.into_iter().map(Into::into).collect();

    Ok(Json(json!({
        "users": user_responses,
        "count": user_responses.len()
    })))
}

/// 查找普通用户；管理员与教师账户对这些接口不可见
async fn find_user(state: &AppState, id: Uuid) -> Result<Account, AppError> {
    state
        .accounts
        .find_by_id(id)
        .await?
        .filter(|account| account.role == Role::User)
        .ok_or_else(|| AppError::not_found("user"))
}

/// 更新用户
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(mut req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    req.profile = req.profile.normalized();

    find_user(&state, id).await?;

    let account = state
        .accounts
        .update(id, &req)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;

    Ok(Json(json!({
        "message": "User updated",
        "user": AccountResponse::from(account)
    })))
}

/// 删除用户
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // 不允许删除自己
    if id.to_string() == auth_context.subject_id {
        return Err(AppError::BadRequest("Cannot delete your own account".to_string()));
    }

    find_user(&state, id).await?;

    if !state.accounts.delete(id).await? {
        return Err(AppError::not_found("user"));
    }

    tracing::info!(account_id = %id, deleted_by = %auth_context.subject_id, "Account deleted");

    Ok(Json(json!({
        "message": "User deleted"
    })))
}
