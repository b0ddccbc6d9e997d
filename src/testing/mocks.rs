//! # 测试 Mock 对象与内存实现

use async_trait::async_trait;
use chrono::Utc;
use mockall::mock;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::store::{Account, CredentialStore, NewAccount, ProfileUpdate, StoreError};

mock! {
    /// 用于注入存储故障的 Mock
    pub CredentialStore {}

    #[async_trait]
    impl CredentialStore for CredentialStore {
        async fn insert_account(&self, account: NewAccount) -> Result<i32, StoreError>;
        async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
        async fn get_account_by_id(&self, id: i32) -> Result<Option<Account>, StoreError>;
        async fn update_profile(
            &self,
            id: i32,
            update: ProfileUpdate,
        ) -> Result<Option<Account>, StoreError>;
    }
}

/// 内存账户存储
///
/// 按邮箱唯一，ID 从 1 开始递增，并记录按 ID 读取的次数。
#[derive(Default)]
pub struct InMemoryCredentialStore {
    accounts: Mutex<HashMap<i32, Account>>,
    next_id: AtomicUsize,
    reads_by_id: AtomicUsize,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `get_account_by_id` 被调用的次数
    #[must_use]
    pub fn reads_by_id(&self) -> usize {
        self.reads_by_id.load(Ordering::SeqCst)
    }

    /// 直接删除账户，模拟令牌有效期内账户消失
    pub fn remove(&self, id: i32) {
        self.lock().remove(&id);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<i32, Account>> {
        self.accounts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn insert_account(&self, account: NewAccount) -> Result<i32, StoreError> {
        let mut accounts = self.lock();
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::UniqueViolation(format!(
                "accounts.email: {}",
                account.email
            )));
        }

        let id = i32::try_from(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
            .map_err(|e| StoreError::Database(sea_orm::DbErr::Custom(e.to_string())))?;
        let now = Utc::now().naive_utc();
        accounts.insert(
            id,
            Account {
                id,
                email: account.email,
                password_hash: account.password_hash,
                first_name: account.first_name,
                last_name: account.last_name,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.lock().values().find(|a| a.email == email).cloned())
    }

    async fn get_account_by_id(&self, id: i32) -> Result<Option<Account>, StoreError> {
        self.reads_by_id.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock().get(&id).cloned())
    }

    async fn update_profile(
        &self,
        id: i32,
        update: ProfileUpdate,
    ) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.lock();
        let Some(account) = accounts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(first_name) = update.first_name {
            account.first_name = Some(first_name);
        }
        if let Some(last_name) = update.last_name {
            account.last_name = Some(last_name);
        }
        account.updated_at = Utc::now().naive_utc();
        Ok(Some(account.clone()))
    }
}
