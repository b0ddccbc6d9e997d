//! # 会话缓存
//!
//! 在 `CacheStore` 之上维护两类数据：
//! - 刷新令牌登记 `refresh:{jti}`，存在即代表该刷新令牌未被撤销
//! - 账户信息 `account:{id}`，仅用于加速鉴权，数据库始终是权威来源

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;

use super::{CacheKey, CacheStore};
use crate::error::{AppError, Result};
use crate::{ldebug, logging::{LogComponent, LogStage}};

/// 刷新令牌登记项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenEntry {
    pub account_id: i32,
    pub expires_at: DateTime<Utc>,
}

/// 缓存的账户信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: i32,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// 会话缓存
#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn CacheStore>,
    account_ttl: Duration,
}

impl SessionCache {
    pub fn new(store: Arc<dyn CacheStore>, account_ttl: Duration) -> Self {
        Self { store, account_ttl }
    }

    /// 登记刷新令牌，`ttl` 为刷新令牌剩余有效期
    pub async fn put_refresh(
        &self,
        token_id: &str,
        entry: &RefreshTokenEntry,
        ttl: Duration,
    ) -> Result<()> {
        self.put_json(&CacheKey::refresh_token(token_id), entry, ttl)
            .await
    }

    pub async fn get_refresh(&self, token_id: &str) -> Result<Option<RefreshTokenEntry>> {
        self.get_json(&CacheKey::refresh_token(token_id)).await
    }

    /// 撤销刷新令牌，重复调用无副作用
    pub async fn delete_refresh(&self, token_id: &str) -> Result<()> {
        self.store
            .delete(&CacheKey::refresh_token(token_id).build())
            .await
    }

    pub async fn get_account(&self, account_id: i32) -> Result<Option<AccountInfo>> {
        self.get_json(&CacheKey::account_info(account_id)).await
    }

    pub async fn put_account(&self, info: &AccountInfo) -> Result<()> {
        self.put_json(&CacheKey::account_info(info.id), info, self.account_ttl)
            .await
    }

    pub async fn invalidate_account(&self, account_id: i32) -> Result<()> {
        self.store
            .delete(&CacheKey::account_info(account_id).build())
            .await
    }

    async fn put_json<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::serialization(format!("序列化缓存值失败: {key}"), e))?;
        self.store.set(&key.build(), &json, ttl).await
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        let Some(json) = self.store.get(&key.build()).await? else {
            ldebug!(
                "system",
                LogStage::Cache,
                LogComponent::Session,
                "cache_miss",
                &format!("缓存未命中: {key}")
            );
            return Ok(None);
        };

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| AppError::serialization(format!("反序列化缓存值失败: {key}"), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use pretty_assertions::assert_eq;

    fn session_cache() -> (Arc<MemoryCache>, SessionCache) {
        let store = Arc::new(MemoryCache::new(64));
        let cache = SessionCache::new(store.clone(), Duration::from_secs(60));
        (store, cache)
    }

    fn sample_account() -> AccountInfo {
        AccountInfo {
            id: 7,
            email: "player@example.com".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
        }
    }

    #[tokio::test]
    async fn test_refresh_entry_lifecycle() {
        let (_, cache) = session_cache();
        let entry = RefreshTokenEntry {
            account_id: 7,
            expires_at: Utc::now() + chrono::Duration::days(7),
        };

        cache
            .put_refresh("jti-1", &entry, Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(cache.get_refresh("jti-1").await.unwrap(), Some(entry));

        cache.delete_refresh("jti-1").await.unwrap();
        cache.delete_refresh("jti-1").await.unwrap();
        assert_eq!(cache.get_refresh("jti-1").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_account_entry_uses_account_ttl() {
        let (_, cache) = session_cache();
        cache.put_account(&sample_account()).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get_account(7).await.unwrap(), Some(sample_account()));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get_account(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalidate_account() {
        let (_, cache) = session_cache();
        cache.put_account(&sample_account()).await.unwrap();
        cache.invalidate_account(7).await.unwrap();
        assert_eq!(cache.get_account(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_keyspaces_do_not_collide() {
        let (store, cache) = session_cache();
        cache.put_account(&sample_account()).await.unwrap();

        assert!(store.get("account:7").await.unwrap().is_some());
        assert_eq!(cache.get_refresh("7").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_value_is_serialization_error() {
        let (store, cache) = session_cache();
        store
            .set("account:7", "{not json", Duration::from_secs(60))
            .await
            .unwrap();

        let err = cache.get_account(7).await.unwrap_err();
        assert!(matches!(err, AppError::Serialization { .. }));
    }
}
