//! # 应用配置结构定义

use crate::ensure_config;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// 生产环境下签名密钥的最小长度
pub const MIN_PRODUCTION_SECRET_LEN: usize = 32;
/// 已启用驱动的数据库 URL 前缀
pub const SUPPORTED_DATABASE_SCHEMES: [&str; 3] = ["sqlite:", "postgres://", "postgresql://"];

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 服务配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: super::DatabaseConfig,
    /// 缓存配置
    pub cache: CacheConfig,
    /// 认证配置
    pub auth: AuthConfig,
    /// 是否为生产环境（影响 Cookie 的 Secure 属性和密钥校验）
    pub is_production: bool,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 允许的 CORS 源，`*` 表示任意源
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// 缓存类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// 内存缓存
    #[default]
    Memory,
    /// Redis缓存
    Redis,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 缓存类型
    pub cache_type: CacheType,
    /// 内存缓存最大条目数
    pub memory_max_entries: usize,
    /// Redis 缓存配置
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<RedisConfig>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: CacheType::Memory,
            memory_max_entries: 10000,
            redis: None,
        }
    }
}

/// Redis配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis连接URL
    pub url: String,
    /// 连接超时时间（秒）
    pub connection_timeout: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            connection_timeout: 10,
        }
    }
}

/// 认证配置
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT 签名密钥
    pub jwt_secret: String,
    /// 访问令牌有效期（秒）
    pub access_token_ttl: u64,
    /// 刷新令牌有效期（秒）
    pub refresh_token_ttl: u64,
    /// 账户信息缓存有效期（秒）
    pub account_cache_ttl: u64,
    /// bcrypt 计算成本
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-only-secret-change-me".to_string(),
            access_token_ttl: 300,
            refresh_token_ttl: 604_800,
            account_cache_ttl: 60,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("account_cache_ttl", &self.account_cache_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl AppConfig {
    /// 用环境变量覆盖配置
    ///
    /// `lookup` 通常是 `std::env::var(..).ok()`，测试中可以传入固定映射。
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("IS_PROD") {
            self.is_production = parse_env("IS_PROD", &value)?;
        }
        if let Some(value) = lookup("LISTEN_PORT") {
            self.server.port = parse_env("LISTEN_PORT", &value)?;
        }
        if let Some(value) = lookup("DATABASE_URL") {
            self.database.url = value;
        }

        let redis_url = lookup("REDIS_URL").or_else(|| {
            match (lookup("VALKEY_HOST"), lookup("VALKEY_PORT")) {
                (Some(host), Some(port)) => Some(format!("redis://{host}:{port}")),
                _ => None,
            }
        });
        if let Some(url) = redis_url {
            self.cache.cache_type = CacheType::Redis;
            self.cache.redis.get_or_insert_with(RedisConfig::default).url = url;
        }

        if let Some(value) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = value;
        }
        if let Some(value) = lookup("ACCESS_TOKEN_EXPIRATION_SECONDS") {
            self.auth.access_token_ttl = parse_env("ACCESS_TOKEN_EXPIRATION_SECONDS", &value)?;
        }
        if let Some(value) = lookup("REFRESH_TOKEN_EXPIRATION_SECONDS") {
            self.auth.refresh_token_ttl = parse_env("REFRESH_TOKEN_EXPIRATION_SECONDS", &value)?;
        }
        if let Some(value) = lookup("ACCOUNT_INFO_CACHE_SECONDS") {
            self.auth.account_cache_ttl = parse_env("ACCOUNT_INFO_CACHE_SECONDS", &value)?;
        }
        if let Some(value) = lookup("BCRYPT_COST") {
            self.auth.bcrypt_cost = parse_env("BCRYPT_COST", &value)?;
        }

        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        ensure_config!(self.server.port != 0, "无效的服务器端口: 0");

        // 验证数据库配置
        ensure_config!(!self.database.url.is_empty(), "数据库URL不能为空");
        ensure_config!(
            SUPPORTED_DATABASE_SCHEMES
                .iter()
                .any(|scheme| self.database.url.starts_with(scheme)),
            "不支持的数据库类型，仅支持 SQLite 和 PostgreSQL"
        );
        ensure_config!(
            self.database.max_connections > 0,
            "数据库最大连接数必须大于0"
        );

        match self.cache.cache_type {
            CacheType::Memory => {
                ensure_config!(
                    self.cache.memory_max_entries > 0,
                    "内存缓存最大条目数必须大于0"
                );
            }
            CacheType::Redis => {
                let redis = self
                    .cache
                    .redis
                    .as_ref()
                    .ok_or_else(|| crate::config_error!("cache_type = \"redis\" 时必须提供 cache.redis 配置"))?;
                ensure_config!(!redis.url.is_empty(), "Redis URL不能为空");
            }
        }

        // 验证认证配置
        let auth = &self.auth;
        ensure_config!(!auth.jwt_secret.is_empty(), "JWT 签名密钥不能为空");
        if self.is_production {
            ensure_config!(
                auth.jwt_secret.len() >= MIN_PRODUCTION_SECRET_LEN,
                "生产环境 JWT 签名密钥长度至少为 {} 字节",
                MIN_PRODUCTION_SECRET_LEN
            );
        }
        ensure_config!(auth.access_token_ttl > 0, "访问令牌有效期必须大于0");
        ensure_config!(auth.refresh_token_ttl > 0, "刷新令牌有效期必须大于0");
        ensure_config!(auth.account_cache_ttl > 0, "账户缓存有效期必须大于0");
        ensure_config!(
            (4..=31).contains(&auth.bcrypt_cost),
            "bcrypt 成本必须在 4 到 31 之间: {}",
            auth.bcrypt_cost
        );

        Ok(())
    }

    /// 监听地址
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| crate::config_error!("环境变量 {} 的值无效: {}", name, value))
}
