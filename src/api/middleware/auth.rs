//! # 认证中间件
//!
//! 从请求头中提取访问令牌，经 `AuthGate` 校验后把账户身份注入到请求扩展中。

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::request_id::RequestId;
use crate::api::response;
use crate::api::server::AppState;
use crate::auth::utils::AuthUtils;
use crate::auth::{AuthenticatedAccount, MISSING_AUTHORIZATION};
use crate::error::AppError;

/// Axum认证中间件
pub async fn auth_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map_or_else(|| "system".to_string(), ToString::to_string);

    let authorization = AuthUtils::extract_authorization_header(request.headers());

    match state
        .gate
        .authenticate(&request_id, authorization.as_deref())
        .await
    {
        Ok(account) => {
            request.extensions_mut().insert(account);
            next.run(request).await
        }
        Err(e) => response::app_error(e),
    }
}

/// 已认证账户提取器
///
/// 只能用于挂载了 [`auth_gate`] 的路由。
impl<S> FromRequestParts<S> for AuthenticatedAccount
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized(MISSING_AUTHORIZATION).into_response())
    }
}
