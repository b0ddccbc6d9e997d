//! # 账户处理器

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;

use crate::api::extract::ApiJson;
use crate::api::response;
use crate::api::server::AppState;
use crate::api::validation;
use crate::auth::AuthenticatedAccount;
use crate::store::ProfileUpdate;

/// 当前账户信息
pub async fn get_me(account: AuthenticatedAccount) -> Response {
    response::success(account.profile)
}

/// 更新当前账户的个人资料
pub async fn update_me(
    State(state): State<AppState>,
    account: AuthenticatedAccount,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Response {
    if let Err(e) = validation::validate_profile_update(&update) {
        return response::app_error(e);
    }

    match state.accounts.update_profile(account.account_id, update).await {
        Ok(info) => response::success(info),
        Err(e) => response::app_error(e),
    }
}

/// 按 ID 查看账户信息
pub async fn get_account(
    State(state): State<AppState>,
    _account: AuthenticatedAccount,
    Path(account_id): Path<i32>,
) -> Response {
    match state.accounts.lookup(account_id).await {
        Ok(Some(info)) => response::success(info),
        Ok(None) => response::error(StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND", "account not found"),
        Err(e) => response::app_error(e),
    }
}
