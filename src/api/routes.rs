//! # 路由配置
//!
//! 定义所有API路由和路由组织

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use crate::api::handlers::{account, auth, system};
use crate::api::middleware::auth_gate;
use crate::api::server::AppState;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(system::ping_handler))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes(state.clone()))
        .with_state(state)
}

/// 认证路由（无需访问令牌）
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
}

/// 账户路由（需要访问令牌）
fn account_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(account::get_me).put(account::update_me))
        .route("/{id}", get(account::get_account))
        .route_layer(from_fn_with_state(state, auth_gate))
}
