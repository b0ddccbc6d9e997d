//! # 请求鉴权
//!
//! 受保护请求的处理顺序：
//! 1. 解析 `Authorization: Bearer <token>`，缺失或格式错误直接拒绝
//! 2. 校验访问令牌
//! 3. 旁路缓存解析账户信息
//!
//! 任一步失败即终止请求，不重试。

use std::sync::Arc;

use crate::auth::account::AccountResolver;
use crate::auth::jwt::TokenIssuer;
use crate::auth::types::{AuthenticatedAccount, MISSING_AUTHORIZATION, TOKEN_INVALID};
use crate::auth::utils::AuthUtils;
use crate::error::{AppError, Result};
use crate::{ldebug, logging::{LogComponent, LogStage}};

/// 鉴权器
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<TokenIssuer>,
    resolver: AccountResolver,
}

impl AuthGate {
    pub fn new(tokens: Arc<TokenIssuer>, resolver: AccountResolver) -> Self {
        Self { tokens, resolver }
    }

    /// 根据 `Authorization` 头的值鉴权
    pub async fn authenticate(
        &self,
        request_id: &str,
        authorization: Option<&str>,
    ) -> Result<AuthenticatedAccount> {
        let Some(token) = authorization.and_then(AuthUtils::extract_bearer_token) else {
            ldebug!(
                request_id,
                LogStage::Authentication,
                LogComponent::Auth,
                "missing_bearer",
                "缺少 Bearer 认证头"
            );
            return Err(AppError::unauthorized(MISSING_AUTHORIZATION));
        };

        let verified = match self.tokens.verify(token) {
            // 刷新令牌不能当作访问令牌使用
            Ok(verified) if verified.token_id.is_none() => verified,
            Ok(_) => return Err(reject(request_id, token, "refresh token presented")),
            Err(e) => return Err(reject(request_id, token, &e.to_string())),
        };

        let profile = self.resolver.resolve(verified.account_id).await?;

        Ok(AuthenticatedAccount {
            account_id: verified.account_id,
            profile,
        })
    }
}

fn reject(request_id: &str, token: &str, reason: &str) -> AppError {
    ldebug!(
        request_id,
        LogStage::Authentication,
        LogComponent::Auth,
        "token_rejected",
        &format!(
            "令牌校验失败: {reason} ({})",
            AuthUtils::sanitize_token_for_logging(token)
        )
    );
    AppError::unauthorized(TOKEN_INVALID)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, SessionCache};
    use crate::error::ErrorCategory;
    use crate::store::{CredentialStore, NewAccount};
    use crate::testing::{InMemoryCredentialStore, test_issuer};
    use chrono::{TimeDelta, Utc};
    use std::time::Duration;

    async fn gate_with_account() -> (Arc<InMemoryCredentialStore>, Arc<TokenIssuer>, AuthGate) {
        let store = Arc::new(InMemoryCredentialStore::new());
        store
            .insert_account(NewAccount {
                email: "player@example.com".to_string(),
                password_hash: "hash".to_string(),
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap();

        let tokens = Arc::new(test_issuer());
        let sessions = SessionCache::new(Arc::new(MemoryCache::new(64)), Duration::from_secs(60));
        let gate = AuthGate::new(
            tokens.clone(),
            AccountResolver::new(store.clone(), sessions),
        );
        (store, tokens, gate)
    }

    fn message(err: &AppError) -> String {
        err.public_message()
    }

    #[tokio::test]
    async fn test_valid_token_resolves_account() {
        let (_, tokens, gate) = gate_with_account().await;
        let access = tokens.issue_access(1).unwrap();

        let account = gate
            .authenticate("req", Some(&format!("Bearer {}", access.token)))
            .await
            .unwrap();
        assert_eq!(account.account_id, 1);
        assert_eq!(account.profile.email, "player@example.com");
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_never_reaches_verifier() {
        let (store, _, gate) = gate_with_account().await;

        for header in [None, Some("Token abc"), Some("Bearer "), Some("Basic dXNlcjpwYXNz")] {
            let err = gate.authenticate("req", header).await.unwrap_err();
            assert_eq!(message(&err), MISSING_AUTHORIZATION);
        }
        assert_eq!(store.reads_by_id(), 0);
    }

    #[tokio::test]
    async fn test_bad_tokens_are_token_invalid() {
        let (store, tokens, gate) = gate_with_account().await;
        let expired = tokens
            .issue_access_at(1, Utc::now() - TimeDelta::hours(1))
            .unwrap();
        let refresh = tokens.issue_refresh(1).unwrap();

        for token in ["garbage", expired.token.as_str(), refresh.token.as_str()] {
            let err = gate
                .authenticate("req", Some(&format!("Bearer {token}")))
                .await
                .unwrap_err();
            assert_eq!(message(&err), TOKEN_INVALID);
            assert_eq!(err.category(), ErrorCategory::Client);
        }
        assert_eq!(store.reads_by_id(), 0);
    }

    #[tokio::test]
    async fn test_deleted_account_is_internal_error() {
        let (store, tokens, gate) = gate_with_account().await;
        let access = tokens.issue_access(1).unwrap();
        store.remove(1);

        let err = gate
            .authenticate("req", Some(&format!("Bearer {}", access.token)))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Server);
        assert_ne!(message(&err), TOKEN_INVALID);
    }
}
