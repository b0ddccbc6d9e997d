//! # 认证类型定义
//!
//! 凭证服务的输入输出结构和对外错误提示

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cache::AccountInfo;

/// 缺少或无法解析 `Authorization: Bearer` 头
pub const MISSING_AUTHORIZATION: &str = "missing authorization header";
/// 令牌签名、算法、签发者、有效期或撤销校验失败
pub const TOKEN_INVALID: &str = "token invalid";
/// 登录失败，不区分账户不存在和密码错误
pub const INVALID_CREDENTIALS: &str = "invalid email or password";
/// 注册时邮箱已被使用
pub const ACCOUNT_EXISTS: &str = "account already exists";

/// 注册请求
#[derive(Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("email", &self.email)
            .field("password", &"***")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// 登录请求
#[derive(Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// 登录结果
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_token_id: String,
    pub account_id: i32,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// 刷新结果
#[derive(Debug, Clone)]
pub struct RefreshOutput {
    pub access_token: String,
    pub account_id: i32,
    pub access_expires_at: DateTime<Utc>,
}

/// 通过鉴权的请求身份，由鉴权中间件写入请求扩展
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedAccount {
    pub account_id: i32,
    pub profile: AccountInfo,
}
