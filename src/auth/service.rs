//! Credential service
//!
//! Registration, login, logout and access token refresh. Owns no state of its
//! own; accounts live in the credential store and refresh token registrations
//! in the session cache.

use chrono::Utc;
use std::sync::Arc;

use crate::auth::jwt::TokenIssuer;
use crate::auth::password::PasswordHasher;
use crate::auth::types::{
    ACCOUNT_EXISTS, INVALID_CREDENTIALS, LoginOutput, RefreshOutput, RegisterInput, TOKEN_INVALID,
};
use crate::auth::utils::AuthUtils;
use crate::cache::{RefreshTokenEntry, SessionCache};
use crate::error::{AppError, Result};
use crate::store::{CredentialStore, NewAccount, StoreError};
use crate::{ldebug, linfo, lwarn, logging::{LogComponent, LogStage}};

/// Credential service
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenIssuer>,
    sessions: SessionCache,
}

impl CredentialService {
    /// Create new credential service
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenIssuer>,
        sessions: SessionCache,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            sessions,
        }
    }

    /// Register a new account and return its id
    pub async fn register(&self, input: RegisterInput) -> Result<i32> {
        let email = AuthUtils::normalize_email(&input.email);
        let password_hash = self.hasher.hash(&input.password).await?;

        let new_account = NewAccount {
            email,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
        };

        match self.store.insert_account(new_account).await {
            Ok(account_id) => {
                linfo!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Auth,
                    "account_registered",
                    "Account registered",
                    account_id = account_id,
                );
                Ok(account_id)
            }
            Err(StoreError::UniqueViolation(_)) => {
                ldebug!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Auth,
                    "register_conflict",
                    "Registration rejected: email already in use"
                );
                Err(AppError::conflict(ACCOUNT_EXISTS))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Verify credentials and mint an access/refresh token pair
    ///
    /// Unknown email and wrong password produce the same error and take the
    /// same bcrypt time.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutput> {
        let email = AuthUtils::normalize_email(email);

        let Some(account) = self.store.get_account_by_email(&email).await? else {
            self.hasher.verify_dummy(password).await;
            return Err(invalid_credentials());
        };

        if !self.hasher.verify(&account.password_hash, password).await {
            return Err(invalid_credentials());
        }

        let now = Utc::now();
        let access = self.tokens.issue_access_at(account.id, now)?;
        let refresh = self.tokens.issue_refresh_at(account.id, now)?;

        let entry = RefreshTokenEntry {
            account_id: account.id,
            expires_at: refresh.expires_at,
        };
        self.sessions
            .put_refresh(&refresh.token_id, &entry, self.tokens.refresh_ttl())
            .await?;

        linfo!(
            "system",
            LogStage::Authentication,
            LogComponent::Auth,
            "login_success",
            "Login succeeded",
            account_id = account.id,
        );

        Ok(LoginOutput {
            access_token: access.token,
            refresh_token: refresh.token,
            refresh_token_id: refresh.token_id,
            account_id: account.id,
            access_expires_at: access.expires_at,
            refresh_expires_at: refresh.expires_at,
        })
    }

    /// Revoke the refresh token with the given id. Idempotent.
    pub async fn logout(&self, refresh_token_id: &str) -> Result<()> {
        self.sessions.delete_refresh(refresh_token_id).await
    }

    /// Revoke the session named by a refresh token.
    ///
    /// The token only has to carry a valid signature; an expired token still
    /// names its session. Anything unparsable is ignored.
    pub async fn logout_token(&self, refresh_token: &str) -> Result<()> {
        match self.tokens.verify_ignoring_expiry(refresh_token) {
            Ok(verified) => match verified.token_id {
                Some(token_id) => self.logout(&token_id).await,
                None => Ok(()),
            },
            Err(e) => {
                ldebug!(
                    "system",
                    LogStage::Authentication,
                    LogComponent::Auth,
                    "logout_ignored",
                    &format!("Ignoring unverifiable refresh token on logout: {e}")
                );
                Ok(())
            }
        }
    }

    /// Exchange a registered, unexpired refresh token for a new access token.
    /// The refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshOutput> {
        let now = Utc::now();
        let verified = self.tokens.verify_at(refresh_token, now)?;

        let Some(token_id) = verified.token_id else {
            return Err(token_invalid("token has no jti"));
        };

        let Some(entry) = self.sessions.get_refresh(&token_id).await? else {
            return Err(token_invalid("refresh token not registered"));
        };

        if entry.expires_at <= now {
            self.sessions.delete_refresh(&token_id).await?;
            return Err(token_invalid("refresh registration expired"));
        }

        if entry.account_id != verified.account_id {
            return Err(token_invalid("refresh registration belongs to another account"));
        }

        let access = self.tokens.issue_access_at(verified.account_id, now)?;

        Ok(RefreshOutput {
            access_token: access.token,
            account_id: verified.account_id,
            access_expires_at: access.expires_at,
        })
    }

    #[must_use]
    pub fn token_issuer(&self) -> &TokenIssuer {
        &self.tokens
    }
}

fn invalid_credentials() -> AppError {
    AppError::unauthorized(INVALID_CREDENTIALS)
}

fn token_invalid(reason: &str) -> AppError {
    lwarn!(
        "system",
        LogStage::Authentication,
        LogComponent::Auth,
        "refresh_rejected",
        &format!("Refresh rejected: {reason}")
    );
    AppError::unauthorized(TOKEN_INVALID)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, MemoryCache};
    use crate::testing::{InMemoryCredentialStore, MockCredentialStore, test_hasher, test_issuer};
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::time::Duration;

    struct Harness {
        service: CredentialService,
        store: Arc<InMemoryCredentialStore>,
        cache: Arc<MemoryCache>,
        sessions: SessionCache,
    }

    fn harness() -> Harness {
        let store = Arc::new(InMemoryCredentialStore::new());
        let cache = Arc::new(MemoryCache::new(1024));
        let sessions = SessionCache::new(cache.clone(), Duration::from_secs(60));
        let service = CredentialService::new(
            store.clone(),
            Arc::new(test_hasher()),
            Arc::new(test_issuer()),
            sessions.clone(),
        );
        Harness {
            service,
            store,
            cache,
            sessions,
        }
    }

    fn register_input(email: &str, password: &str) -> RegisterInput {
        RegisterInput {
            email: email.to_string(),
            password: password.to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let h = harness();
        let id = h
            .service
            .register(register_input("Player@Example.com", "password-123"))
            .await
            .unwrap();
        assert_eq!(id, 1);

        let stored = h.store.get_account_by_id(1).await.unwrap().unwrap();
        assert_eq!(stored.email, "player@example.com");
        assert_ne!(stored.password_hash, "password-123");

        let output = h
            .service
            .login("  PLAYER@example.com", "password-123")
            .await
            .unwrap();
        assert_eq!(output.account_id, 1);

        let verified = h.service.token_issuer().verify(&output.access_token).unwrap();
        assert_eq!(verified.account_id, 1);
        assert_eq!(verified.expires_at, output.access_expires_at);

        let entry = h
            .sessions
            .get_refresh(&output.refresh_token_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.account_id, 1);
        assert_eq!(entry.expires_at, output.refresh_expires_at);
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_case_insensitive() {
        let h = harness();
        h.service
            .register(register_input("player@example.com", "password-123"))
            .await
            .unwrap();

        let err = h
            .service
            .register(register_input("PLAYER@EXAMPLE.COM", "another-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { ref message } if message == ACCOUNT_EXISTS));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_identical() {
        let h = harness();
        h.service
            .register(register_input("player@example.com", "password-123"))
            .await
            .unwrap();

        let wrong_password = h
            .service
            .login("player@example.com", "password-124")
            .await
            .unwrap_err();
        let unknown_email = h
            .service
            .login("nobody@example.com", "password-123")
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(
            wrong_password.to_http_response_parts(),
            unknown_email.to_http_response_parts()
        );
        assert_eq!(wrong_password.public_message(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_password_sharing_bcrypt_prefix_is_rejected() {
        let h = harness();
        let prefix = "a".repeat(72);

        let err = h
            .service
            .register(register_input("player@example.com", &format!("{prefix}REAL-SUFFIX")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(h.store.get_account_by_id(1).await.unwrap().is_none());

        h.service
            .register(register_input("player@example.com", &prefix))
            .await
            .unwrap();
        let err = h
            .service
            .login("player@example.com", &format!("{prefix}WRONG-SUFFIX"))
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_logout_revokes_refresh_token() {
        let h = harness();
        h.service
            .register(register_input("player@example.com", "password-123"))
            .await
            .unwrap();
        let output = h
            .service
            .login("player@example.com", "password-123")
            .await
            .unwrap();

        assert!(h.service.refresh(&output.refresh_token).await.is_ok());

        h.service.logout(&output.refresh_token_id).await.unwrap();
        h.service.logout(&output.refresh_token_id).await.unwrap();

        let err = h.service.refresh(&output.refresh_token).await.unwrap_err();
        assert_eq!(err.public_message(), TOKEN_INVALID);
    }

    #[tokio::test]
    async fn test_logout_token_and_garbage() {
        let h = harness();
        h.service
            .register(register_input("player@example.com", "password-123"))
            .await
            .unwrap();
        let output = h
            .service
            .login("player@example.com", "password-123")
            .await
            .unwrap();

        h.service.logout_token("not-a-token").await.unwrap();
        assert!(h.service.refresh(&output.refresh_token).await.is_ok());

        h.service.logout_token(&output.refresh_token).await.unwrap();
        assert!(h.service.refresh(&output.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_multiple_sessions_are_independent() {
        let h = harness();
        h.service
            .register(register_input("player@example.com", "password-123"))
            .await
            .unwrap();
        let first = h.service.login("player@example.com", "password-123").await.unwrap();
        let second = h.service.login("player@example.com", "password-123").await.unwrap();
        assert_ne!(first.refresh_token_id, second.refresh_token_id);

        h.service.logout(&first.refresh_token_id).await.unwrap();
        assert!(h.service.refresh(&first.refresh_token).await.is_err());
        assert!(h.service.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let h = harness();
        h.service
            .register(register_input("player@example.com", "password-123"))
            .await
            .unwrap();
        let output = h.service.login("player@example.com", "password-123").await.unwrap();

        let err = h.service.refresh(&output.access_token).await.unwrap_err();
        assert_eq!(err.public_message(), TOKEN_INVALID);
    }

    #[tokio::test]
    async fn test_refresh_rejects_mismatched_or_stale_entry() {
        let h = harness();
        let issuer = h.service.token_issuer();
        let refresh = issuer.issue_refresh(1).unwrap();

        let other_account = RefreshTokenEntry {
            account_id: 2,
            expires_at: refresh.expires_at,
        };
        h.sessions
            .put_refresh(&refresh.token_id, &other_account, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(h.service.refresh(&refresh.token).await.is_err());

        let stale = RefreshTokenEntry {
            account_id: 1,
            expires_at: Utc::now() - TimeDelta::seconds(1),
        };
        h.sessions
            .put_refresh(&refresh.token_id, &stale, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(h.service.refresh(&refresh.token).await.is_err());
        assert!(
            h.cache
                .get(&format!("refresh:{}", refresh.token_id))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_refresh_issues_access_for_subject() {
        let h = harness();
        h.service
            .register(register_input("player@example.com", "password-123"))
            .await
            .unwrap();
        let output = h.service.login("player@example.com", "password-123").await.unwrap();

        let refreshed = h.service.refresh(&output.refresh_token).await.unwrap();
        assert_eq!(refreshed.account_id, 1);
        let verified = h.service.token_issuer().verify(&refreshed.access_token).unwrap();
        assert_eq!(verified.account_id, 1);
        assert_eq!(verified.token_id, None);
    }

    #[tokio::test]
    async fn test_store_failure_is_internal() {
        let mut store = MockCredentialStore::new();
        store
            .expect_insert_account()
            .returning(|_| Err(StoreError::Database(sea_orm::DbErr::Custom("disk full".into()))));
        store
            .expect_get_account_by_email()
            .returning(|_| Err(StoreError::Database(sea_orm::DbErr::Custom("gone".into()))));

        let service = CredentialService::new(
            Arc::new(store),
            Arc::new(test_hasher()),
            Arc::new(test_issuer()),
            SessionCache::new(Arc::new(MemoryCache::new(16)), Duration::from_secs(60)),
        );

        let err = service
            .register(register_input("player@example.com", "password-123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database { .. }));

        let err = service.login("player@example.com", "password-123").await.unwrap_err();
        assert!(matches!(err, AppError::Database { .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_register_then_login_succeeds(
            local in "[a-z][a-z0-9]{1,10}",
            domain in "[a-z]{2,8}",
            password in "[ -~]{8,40}",
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let h = harness();
                let email = format!("{local}@{domain}.com");
                let id = h
                    .service
                    .register(register_input(&email.to_uppercase(), &password))
                    .await
                    .unwrap();

                let output = h.service.login(&email, &password).await.unwrap();
                assert_eq!(output.account_id, id);

                let wrong = format!("{password}x");
                assert!(h.service.login(&email, &wrong).await.is_err());
            });
        }
    }
}
