//! # 缓存抽象层
//!
//! 提供统一的键值缓存接口，支持内存缓存和Redis缓存。
//! 值一律为字符串（JSON），未命中返回 `Ok(None)` 而不是错误。

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::Result;

/// 缓存抽象trait
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 获取缓存值，未命中或已过期返回 `None`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 设置缓存值，`ttl` 之后不可再读到
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// 删除缓存值，键不存在时同样成功
    async fn delete(&self, key: &str) -> Result<()>;
}

/// 缓存项
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(value: String, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// 内存缓存实现
///
/// 过期项在读取时惰性清理；写入时若已达容量上限，先清理过期项，
/// 仍然不足则淘汰最早过期的一项。
pub struct MemoryCache {
    data: DashMap<String, CacheEntry>,
    max_entries: usize,
}

impl MemoryCache {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            data: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// 当前条目数（包含尚未清理的过期项）
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn cleanup_expired(&self) {
        let now = Instant::now();
        self.data.retain(|_, entry| !entry.is_expired(now));
    }

    fn ensure_capacity(&self, incoming_key: &str) {
        if self.data.contains_key(incoming_key) || self.data.len() < self.max_entries {
            return;
        }

        self.cleanup_expired();
        if self.data.len() < self.max_entries {
            return;
        }

        let oldest = self
            .data
            .iter()
            .min_by_key(|item| item.value().expires_at)
            .map(|item| item.key().clone());
        if let Some(key) = oldest {
            self.data.remove(&key);
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        match self.data.get(key) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        self.data.remove_if(key, |_, entry| entry.is_expired(now));
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.ensure_capacity(key);
        self.data
            .insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }
}
