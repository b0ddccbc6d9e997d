//! # 缓存模块
//!
//! 缓存存储抽象、内存/Redis 实现以及会话缓存

pub mod abstract_cache;
pub mod client;
pub mod keys;
pub mod session;

pub use abstract_cache::{CacheStore, MemoryCache};
pub use client::RedisCache;
pub use keys::CacheKey;
pub use session::{AccountInfo, RefreshTokenEntry, SessionCache};

use crate::config::{CacheConfig, CacheType};
use crate::error::{AppError, Result};
use crate::{linfo, logging::{LogComponent, LogStage}};
use std::sync::Arc;

/// 按配置创建缓存存储
pub async fn build_cache_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>> {
    match config.cache_type {
        CacheType::Memory => {
            linfo!(
                "system",
                LogStage::Startup,
                LogComponent::Cache,
                "use_memory_cache",
                &format!("使用内存缓存，最大条目数: {}", config.memory_max_entries)
            );
            Ok(Arc::new(MemoryCache::new(config.memory_max_entries)))
        }
        CacheType::Redis => {
            let redis = config
                .redis
                .as_ref()
                .ok_or_else(|| AppError::config("cache_type = \"redis\" 时必须提供 cache.redis 配置"))?;
            Ok(Arc::new(RedisCache::connect(redis).await?))
        }
    }
}
