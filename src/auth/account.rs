//! # 账户信息解析
//!
//! 旁路缓存读取：先查 `account:{id}`，未命中则读存储并回填缓存。
//! 存储始终是权威来源，资料更新后立即失效缓存。

use std::sync::Arc;

use crate::cache::{AccountInfo, SessionCache};
use crate::error::{AppError, Result};
use crate::store::{Account, CredentialStore, ProfileUpdate};
use crate::{ldebug, lerror, logging::{LogComponent, LogStage}};

impl From<Account> for AccountInfo {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
        }
    }
}

/// 账户解析器
#[derive(Clone)]
pub struct AccountResolver {
    store: Arc<dyn CredentialStore>,
    sessions: SessionCache,
}

impl AccountResolver {
    pub fn new(store: Arc<dyn CredentialStore>, sessions: SessionCache) -> Self {
        Self { store, sessions }
    }

    /// 解析账户信息
    ///
    /// 账户在存储中不存在属于服务端一致性问题，返回 `NotFound`（映射为 500）。
    pub async fn resolve(&self, account_id: i32) -> Result<AccountInfo> {
        self.lookup(account_id)
            .await?
            .ok_or_else(|| missing_account(account_id))
    }

    /// 查找账户信息，不存在时返回 `None`
    pub async fn lookup(&self, account_id: i32) -> Result<Option<AccountInfo>> {
        if let Some(info) = self.sessions.get_account(account_id).await? {
            ldebug!(
                "system",
                LogStage::Cache,
                LogComponent::Account,
                "account_cache_hit",
                "账户缓存命中",
                account_id = account_id,
            );
            return Ok(Some(info));
        }

        let Some(account) = self.store.get_account_by_id(account_id).await? else {
            return Ok(None);
        };

        let info = AccountInfo::from(account);
        self.sessions.put_account(&info).await?;
        Ok(Some(info))
    }

    /// 更新个人资料并失效缓存
    pub async fn update_profile(
        &self,
        account_id: i32,
        update: ProfileUpdate,
    ) -> Result<AccountInfo> {
        let account = self
            .store
            .update_profile(account_id, update)
            .await?
            .ok_or_else(|| missing_account(account_id))?;

        self.sessions.invalidate_account(account_id).await?;
        Ok(AccountInfo::from(account))
    }
}

fn missing_account(account_id: i32) -> AppError {
    lerror!(
        "system",
        LogStage::Db,
        LogComponent::Account,
        "account_missing",
        "令牌有效但账户不存在",
        account_id = account_id,
    );
    AppError::not_found("account", account_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::error::ErrorCategory;
    use crate::store::{NewAccount, StoreError};
    use crate::testing::{InMemoryCredentialStore, MockCredentialStore};
    use std::time::Duration;

    async fn seeded() -> (Arc<InMemoryCredentialStore>, AccountResolver) {
        let store = Arc::new(InMemoryCredentialStore::new());
        store
            .insert_account(NewAccount {
                email: "player@example.com".to_string(),
                password_hash: "hash".to_string(),
                first_name: Some("Ada".to_string()),
                last_name: None,
            })
            .await
            .unwrap();
        let sessions = SessionCache::new(Arc::new(MemoryCache::new(64)), Duration::from_secs(60));
        let resolver = AccountResolver::new(store.clone(), sessions);
        (store, resolver)
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_aside_reads_store_once_per_ttl() {
        let (store, resolver) = seeded().await;

        for _ in 0..5 {
            let info = resolver.resolve(1).await.unwrap();
            assert_eq!(info.email, "player@example.com");
        }
        assert_eq!(store.reads_by_id(), 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        resolver.resolve(1).await.unwrap();
        resolver.resolve(1).await.unwrap();
        assert_eq!(store.reads_by_id(), 2);
    }

    #[tokio::test]
    async fn test_update_profile_invalidates_cache() {
        let (store, resolver) = seeded().await;
        resolver.resolve(1).await.unwrap();

        let updated = resolver
            .update_profile(
                1,
                ProfileUpdate {
                    first_name: Some("Grace".to_string()),
                    last_name: Some("Hopper".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name.as_deref(), Some("Grace"));

        let info = resolver.resolve(1).await.unwrap();
        assert_eq!(info.first_name.as_deref(), Some("Grace"));
        assert_eq!(info.last_name.as_deref(), Some("Hopper"));
        assert_eq!(store.reads_by_id(), 2);
    }

    #[tokio::test]
    async fn test_missing_account_is_server_error() {
        let (_, resolver) = seeded().await;
        let err = resolver.resolve(99).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.category(), ErrorCategory::Server);
    }

    #[tokio::test]
    async fn test_lookup_unknown_account_is_none() {
        let (store, resolver) = seeded().await;

        assert!(resolver.lookup(42).await.unwrap().is_none());
        assert!(resolver.lookup(1).await.unwrap().is_some());
        assert_eq!(store.reads_by_id(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut store = MockCredentialStore::new();
        store
            .expect_get_account_by_id()
            .times(1)
            .returning(|_| Err(StoreError::Database(sea_orm::DbErr::Custom("down".into()))));

        let sessions = SessionCache::new(Arc::new(MemoryCache::new(8)), Duration::from_secs(60));
        let resolver = AccountResolver::new(Arc::new(store), sessions);

        let err = resolver.resolve(1).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Server);
    }
}
