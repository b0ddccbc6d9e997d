//! # Redis 缓存客户端
//!
//! 基于 `ConnectionManager` 的 `CacheStore` 实现，断线后自动重连

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;

use super::CacheStore;
use crate::config::RedisConfig;
use crate::error::{AppError, Result};
use crate::{ldebug, linfo, logging::{LogComponent, LogStage}};

/// Redis 缓存
#[derive(Clone)]
pub struct RedisCache {
    connection_manager: ConnectionManager,
}

impl RedisCache {
    /// 连接 Redis 服务器
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Cache,
            "connect_to_redis",
            &format!("正在连接 Redis 服务器: {}", redact_redis_url(&config.url))
        );

        let client = Client::open(config.url.as_str())
            .map_err(|e| AppError::cache_with_source("创建 Redis 客户端失败", e))?;

        let connection_manager = tokio::time::timeout(
            Duration::from_secs(config.connection_timeout),
            ConnectionManager::new(client),
        )
        .await
        .map_err(|_| AppError::cache(format!("连接 Redis 超时 ({}s)", config.connection_timeout)))?
        .map_err(|e| AppError::cache_with_source("建立 Redis 连接失败", e))?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::Cache,
            "redis_connected",
            "Redis 连接建立成功"
        );

        Ok(Self { connection_manager })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection_manager.clone();

        let result: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| AppError::cache_with_source(format!("获取缓存失败: {key}"), e))?;

        ldebug!(
            "system",
            LogStage::Cache,
            LogComponent::Cache,
            "get_cache",
            &format!("缓存{}: {}", if result.is_some() { "命中" } else { "未命中" }, key)
        );
        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        // PSETEX 不接受 0 毫秒
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.connection_manager.clone();

        conn.pset_ex::<_, _, ()>(key, value, millis)
            .await
            .map_err(|e| AppError::cache_with_source(format!("设置缓存失败: {key}"), e))?;

        ldebug!(
            "system",
            LogStage::Cache,
            LogComponent::Cache,
            "set_cache",
            &format!("设置缓存: key={key}, ttl={millis}ms")
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection_manager.clone();

        conn.del::<_, ()>(key)
            .await
            .map_err(|e| AppError::cache_with_source(format!("删除缓存失败: {key}"), e))?;
        Ok(())
    }
}

fn redact_redis_url(url: &str) -> String {
    match url.rfind('@') {
        Some(at) => format!("redis://***{}", &url[at..]),
        None => url.to_string(),
    }
}
