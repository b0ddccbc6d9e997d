//! # 测试辅助函数

use sea_orm::{DatabaseConnection, DbErr};
use std::time::Duration;

use crate::auth::{BcryptHasher, TokenIssuer};
use crate::config::{AppConfig, DatabaseConfig};

/// 测试用签名密钥
pub const TEST_JWT_SECRET: &str = "test-secret-key-for-jwt-testing";
/// bcrypt 允许的最低成本，仅用于测试
pub const TEST_BCRYPT_COST: u32 = 4;

/// 创建已迁移的内存数据库
pub async fn create_test_db() -> Result<DatabaseConnection, DbErr> {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    };
    let db = crate::database::init_database(&config).await?;
    crate::database::run_migrations(&db).await?;
    Ok(db)
}

/// 低成本的 bcrypt 哈希器
#[must_use]
pub fn test_hasher() -> BcryptHasher {
    match BcryptHasher::new(TEST_BCRYPT_COST) {
        Ok(hasher) => hasher,
        Err(e) => panic!("创建测试哈希器失败: {e}"),
    }
}

/// 默认有效期的令牌签发器
#[must_use]
pub fn test_issuer() -> TokenIssuer {
    match TokenIssuer::new(
        TEST_JWT_SECRET,
        Duration::from_secs(300),
        Duration::from_secs(604_800),
    ) {
        Ok(issuer) => issuer,
        Err(e) => panic!("创建测试令牌签发器失败: {e}"),
    }
}

/// 使用内存数据库和内存缓存的应用配置
#[must_use]
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".to_string();
    config.auth.jwt_secret = TEST_JWT_SECRET.to_string();
    config.auth.bcrypt_cost = TEST_BCRYPT_COST;
    config
}
