//! # 凭证服务集成测试
//!
//! 使用 SQLite 内存库和内存缓存组装真实组件

use chrono::{TimeDelta, Utc};
use game_auth::auth::{
    BcryptHasher, CredentialService, INVALID_CREDENTIALS, RegisterInput, TOKEN_INVALID,
    TokenIssuer,
};
use game_auth::cache::{MemoryCache, SessionCache};
use game_auth::config::DatabaseConfig;
use game_auth::database::{init_database, run_migrations};
use game_auth::error::{AppError, ErrorCategory};
use game_auth::store::SeaOrmCredentialStore;
use std::sync::Arc;
use std::time::Duration;

const PASSWORD: &str = "correct horse battery";

async fn service() -> CredentialService {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        ..DatabaseConfig::default()
    };
    let db = init_database(&config).await.unwrap();
    run_migrations(&db).await.unwrap();

    let tokens = TokenIssuer::new(
        "integration-test-secret",
        Duration::from_secs(300),
        Duration::from_secs(604_800),
    )
    .unwrap();
    let sessions = SessionCache::new(Arc::new(MemoryCache::new(1024)), Duration::from_secs(60));

    CredentialService::new(
        Arc::new(SeaOrmCredentialStore::new(Arc::new(db))),
        Arc::new(BcryptHasher::new(4).unwrap()),
        Arc::new(tokens),
        sessions,
    )
}

fn input(email: &str) -> RegisterInput {
    RegisterInput {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        first_name: None,
        last_name: None,
    }
}

#[tokio::test]
async fn test_ids_are_sequential_and_emails_unique() {
    let service = service().await;

    assert_eq!(service.register(input("a@example.com")).await.unwrap(), 1);
    assert_eq!(service.register(input("b@example.com")).await.unwrap(), 2);

    let err = service.register(input("A@EXAMPLE.com")).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict { .. }));
}

#[tokio::test]
async fn test_login_normalizes_email() {
    let service = service().await;
    service.register(input("Player@Example.com")).await.unwrap();

    let output = service.login("  player@example.COM ", PASSWORD).await.unwrap();
    assert_eq!(output.account_id, 1);

    let err = service.login("player@example.com", "nope-nope").await.unwrap_err();
    assert_eq!(err.public_message(), INVALID_CREDENTIALS);
    assert_eq!(err.category(), ErrorCategory::Client);
}

#[tokio::test]
async fn test_each_login_is_an_independent_session() {
    let service = service().await;
    service.register(input("player@example.com")).await.unwrap();

    let first = service.login("player@example.com", PASSWORD).await.unwrap();
    let second = service.login("player@example.com", PASSWORD).await.unwrap();
    assert_ne!(first.refresh_token_id, second.refresh_token_id);

    service.logout(&first.refresh_token_id).await.unwrap();

    let err = service.refresh(&first.refresh_token).await.unwrap_err();
    assert_eq!(err.public_message(), TOKEN_INVALID);

    let refreshed = service.refresh(&second.refresh_token).await.unwrap();
    assert_eq!(refreshed.account_id, 1);
    assert!(refreshed.access_expires_at > Utc::now());
    assert!(refreshed.access_expires_at <= Utc::now() + TimeDelta::seconds(300));
}

#[tokio::test]
async fn test_access_token_cannot_refresh() {
    let service = service().await;
    service.register(input("player@example.com")).await.unwrap();
    let output = service.login("player@example.com", PASSWORD).await.unwrap();

    let err = service.refresh(&output.access_token).await.unwrap_err();
    assert_eq!(err.public_message(), TOKEN_INVALID);
}
