//! 应用上下文（DI 容器）
//!
//! 统一持有跨模块共享的服务实例，便于在测试中注入替身实现。

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AccountResolver, AuthGate, BcryptHasher, CredentialService, TokenIssuer};
use crate::cache::{CacheStore, SessionCache, build_cache_store};
use crate::config::AppConfig;
use crate::error::{Context, Result};
use crate::store::{CredentialStore, SeaOrmCredentialStore};
use crate::{database, linfo, logging::{LogComponent, LogStage}};

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub credentials: CredentialService,
    pub accounts: AccountResolver,
    pub gate: AuthGate,
}

impl AppContext {
    /// 由已建立的存储和缓存组装服务
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn CredentialStore>,
        cache: Arc<dyn CacheStore>,
    ) -> Result<Self> {
        let tokens = Arc::new(TokenIssuer::from_config(&config.auth)?);
        let hasher = Arc::new(BcryptHasher::new(config.auth.bcrypt_cost)?);
        let sessions = SessionCache::new(cache, Duration::from_secs(config.auth.account_cache_ttl));

        let accounts = AccountResolver::new(store.clone(), sessions.clone());
        let gate = AuthGate::new(tokens.clone(), accounts.clone());
        let credentials = CredentialService::new(store, hasher, tokens, sessions);

        Ok(Self {
            config,
            credentials,
            accounts,
            gate,
        })
    }

    /// 按配置连接数据库、执行迁移并创建缓存
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let db: DatabaseConnection = database::init_database(&config.database)
            .await
            .context("数据库初始化失败")?;
        database::run_migrations(&db)
            .await
            .context("数据库迁移失败")?;

        let cache = build_cache_store(&config.cache).await?;
        let store = Arc::new(SeaOrmCredentialStore::new(Arc::new(db)));

        let context = Self::new(Arc::new(config), store, cache)?;
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "context_ready",
            "应用上下文初始化完成"
        );
        Ok(context)
    }

    #[must_use]
    pub fn token_issuer(&self) -> &TokenIssuer {
        self.credentials.token_issuer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RegisterInput;
    use crate::testing::test_config;

    #[tokio::test]
    async fn test_context_wires_services_together() {
        let context = AppContext::from_config(test_config()).await.unwrap();

        let account_id = context
            .credentials
            .register(RegisterInput {
                email: "player@example.com".to_string(),
                password: "password-123".to_string(),
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap();
        let output = context
            .credentials
            .login("player@example.com", "password-123")
            .await
            .unwrap();

        let authorization = format!("Bearer {}", output.access_token);
        let account = context
            .gate
            .authenticate("req", Some(&authorization))
            .await
            .unwrap();
        assert_eq!(account.account_id, account_id);
        assert_eq!(
            context.token_issuer().access_ttl(),
            Duration::from_secs(context.config.auth.access_token_ttl)
        );
    }
}
