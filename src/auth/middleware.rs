//! JWT 认证与角色授权中间件
//!
//! Each protected request passes through
//! `NoToken -> ParsedToken -> VerifiedClaims -> AuthorizedContext`,
//! leaving early as a [`Rejection`].

use super::{
    error::Rejection,
    jwt::{Claims, JwtService},
    role::{Role, RoleSet},
};
use crate::{error::AppError, middleware::AppState};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub subject_id: String,
    pub role: Role,
    pub email: String,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub,
            role: claims.role,
            email: claims.email,
        }
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// 从 Authorization 头提取令牌
pub fn extract_token(headers: &HeaderMap) -> Result<&str, Rejection> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(Rejection::MissingCredential)?;

    if token.is_empty() {
        return Err(Rejection::MissingCredential);
    }

    Ok(token)
}

/// Framework-independent access check
#[derive(Clone)]
pub struct AccessGate {
    jwt_service: Arc<JwtService>,
}

impl AccessGate {
    pub fn new(jwt_service: Arc<JwtService>) -> Self {
        Self { jwt_service }
    }

    /// Steps 1 and 2: extract and verify the bearer token
    pub fn authenticate_at(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<AuthContext, Rejection> {
        let token = extract_token(headers)?;

        let claims = self.jwt_service.verify_at(token, now).map_err(|e| {
            tracing::warn!(reason = e.kind(), "Token verification failed");
            Rejection::InvalidCredential(e)
        })?;

        Ok(claims.into())
    }

    /// Step 3: role check against the route's allow-list
    pub fn authorize(context: &AuthContext, allowed: RoleSet) -> Result<(), Rejection> {
        if allowed.permits(context.role) {
            return Ok(());
        }

        tracing::warn!(
            subject_id = %context.subject_id,
            role = %context.role,
            allowed = %allowed,
            "Role not permitted"
        );
        Err(Rejection::Forbidden)
    }

    /// Full gate: authenticate, then authorize
    pub fn check_at(
        &self,
        headers: &HeaderMap,
        allowed: RoleSet,
        now: DateTime<Utc>,
    ) -> Result<AuthContext, Rejection> {
        let context = self.authenticate_at(headers, now)?;
        Self::authorize(&context, allowed)?;
        Ok(context)
    }

    pub fn check(&self, headers: &HeaderMap, allowed: RoleSet) -> Result<AuthContext, Rejection> {
        self.check_at(headers, allowed, Utc::now())
    }
}

fn record_rejection(rejection: &Rejection) {
    metrics::counter!("auth_rejections_total", "reason" => rejection.reason()).increment(1);
}

/// JWT 认证中间件 - 必须认证
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_context = state
        .access_gate
        .authenticate_at(req.headers(), Utc::now())
        .inspect_err(record_rejection)?;

    // 附加到请求扩展
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// 角色检查中间件，必须位于 `authenticate` 之内
pub async fn require_roles(
    allowed: RoleSet,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_context = get_auth_context(&req)?;

    AccessGate::authorize(&auth_context, allowed).inspect_err(record_rejection)?;

    Ok(next.run(req).await)
}

/// 从扩展中提取 AuthContext 的辅助函数
pub fn get_auth_context(req: &Request) -> Result<AuthContext, AppError> {
    req.extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or(AppError::Unauthorized)
}
