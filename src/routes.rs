//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    extract::Request,
    http::{header, Method},
    middleware::{self, Next},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::{
    auth::{authenticate, require_roles, ADMIN_ONLY, STAFF, USER_ONLY},
    handlers,
    middleware::{request_tracking_middleware, AppState},
};

/// 请求体上限（字节）
const MAX_BODY_BYTES: usize = 64 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查、登录、注册）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/api/admin/register", post(handlers::auth::register_admin))
        .route("/api/admin/login", post(handlers::auth::admin_login))
        .route("/api/users/register", post(handlers::auth::register_user))
        .route("/api/users/login", post(handlers::auth::user_login));

    // 仅管理员
    let admin_routes = Router::new()
        .route("/api/admin/registerUser", post(handlers::auth::register_user))
        .route("/api/admin/users", get(handlers::user::list_users))
        .route(
            "/api/admin/user/{id}",
            put(handlers::user::update_user).delete(handlers::user::delete_user),
        )
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_roles(ADMIN_ONLY, req, next)
        }));

    // 教师与管理员
    let staff_routes = Router::new()
        .route("/api/users", post(handlers::auth::register_user))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_roles(STAFF, req, next)
        }));

    // 仅普通用户
    let user_routes = Router::new()
        .route("/api/users/checkToken", get(handlers::auth::check_token))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_roles(USER_ONLY, req, next)
        }));

    // 角色检查在认证之内执行
    let protected_routes = Router::new()
        .merge(admin_routes)
        .merge(staff_routes)
        .merge(user_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_tracking_middleware))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
