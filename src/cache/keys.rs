//! # 缓存键命名规范
//!
//! 刷新令牌登记和账户信息共用同一个缓存存储，通过前缀区分

use std::fmt;

/// 缓存键类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheKey {
    /// 刷新令牌登记 - `refresh:{token_id}`
    RefreshToken { token_id: String },

    /// 账户信息缓存 - `account:{account_id}`
    AccountInfo { account_id: i32 },
}

impl CacheKey {
    /// 生成缓存键字符串
    #[must_use]
    pub fn build(&self) -> String {
        match self {
            Self::RefreshToken { token_id } => format!("refresh:{token_id}"),
            Self::AccountInfo { account_id } => format!("account:{account_id}"),
        }
    }

    #[must_use]
    pub fn refresh_token(token_id: &str) -> Self {
        Self::RefreshToken {
            token_id: token_id.to_string(),
        }
    }

    #[must_use]
    pub const fn account_info(account_id: i32) -> Self {
        Self::AccountInfo { account_id }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}
