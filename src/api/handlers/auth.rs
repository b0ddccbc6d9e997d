//! # 认证处理器
//!
//! 注册、登录、刷新访问令牌和登出。刷新令牌只通过 HttpOnly Cookie 传递。

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};
use serde::Serialize;

use crate::api::extract::ApiJson;
use crate::api::response;
use crate::api::server::AppState;
use crate::api::validation;
use crate::auth::{LoginInput, RegisterInput, TOKEN_INVALID};
use crate::error::AppError;

pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub const TOKEN_TYPE: &str = "Bearer";

/// 注册响应
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub account_id: i32,
}

/// 访问令牌响应
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// 访问令牌有效期（秒）
    pub expires_in: u64,
}

impl TokenResponse {
    fn bearer(access_token: String, state: &AppState) -> Self {
        Self {
            access_token,
            token_type: TOKEN_TYPE,
            expires_in: state.token_issuer().access_ttl().as_secs(),
        }
    }
}

/// 注册账户
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Response {
    if let Err(e) = validation::validate_register(&input) {
        return response::app_error(e);
    }

    match state.credentials.register(input).await {
        Ok(account_id) => response::created(RegisterResponse { account_id }),
        Err(e) => response::app_error(e),
    }
}

/// 登录并下发刷新令牌 Cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(input): ApiJson<LoginInput>,
) -> Response {
    if let Err(e) = validation::validate_login(&input) {
        return response::app_error(e);
    }

    let output = match state.credentials.login(&input.email, &input.password).await {
        Ok(output) => output,
        Err(e) => return response::app_error(e),
    };

    let cookie = refresh_cookie(&state, output.refresh_token);
    let body = TokenResponse::bearer(output.access_token, &state);
    (jar.add(cookie), response::success(body)).into_response()
}

/// 用刷新令牌换取新的访问令牌
pub async fn refresh(State(state): State<AppState>, jar: CookieJar) -> Response {
    let Some(token) = jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string()) else {
        return response::app_error(AppError::unauthorized(TOKEN_INVALID));
    };

    match state.credentials.refresh(&token).await {
        Ok(output) => response::success(TokenResponse::bearer(output.access_token, &state)),
        Err(e) => response::app_error(e),
    }
}

/// 登出：撤销 Cookie 中的刷新令牌并清除 Cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(token) = jar.get(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_string()) {
        if let Err(e) = state.credentials.logout_token(&token).await {
            return response::app_error(e);
        }
    }

    let removal = Cookie::build(REFRESH_TOKEN_COOKIE).path("/");
    (jar.remove(removal), response::no_content()).into_response()
}

fn refresh_cookie(state: &AppState, value: String) -> Cookie<'static> {
    let max_age = i64::try_from(state.token_issuer().refresh_ttl().as_secs()).unwrap_or(i64::MAX);
    Cookie::build((REFRESH_TOKEN_COOKIE, value))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::seconds(max_age))
        .secure(state.config.is_production)
        .build()
}
