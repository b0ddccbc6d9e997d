//! # 凭证存储
//!
//! 账户的持久化接口。业务层只依赖 `CredentialStore` trait，
//! 生产环境使用 sea-orm 实现，测试使用内存实现或 mock。

mod accounts;

pub use accounts::SeaOrmCredentialStore;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sea_orm::DbErr;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::error::AppError;

/// 存储层错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 违反唯一约束（邮箱已存在）
    #[error("唯一约束冲突: {0}")]
    UniqueViolation(String),

    /// 其它数据库错误
    #[error("数据库操作失败: {0}")]
    Database(#[from] DbErr),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::database_with_source("账户存储操作失败", err)
    }
}

/// 账户记录
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"***")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl From<entity::accounts::Model> for Account {
    fn from(model: entity::accounts::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            password_hash: model.password_hash,
            first_name: model.first_name,
            last_name: model.last_name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// 待插入的账户
#[derive(Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("password_hash", &"***")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// 个人资料更新，`None` 表示保持不变
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// 账户存储接口
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 插入账户并返回新分配的 ID
    async fn insert_account(&self, account: NewAccount) -> Result<i32, StoreError>;

    /// 按（已规范化的）邮箱查找
    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn get_account_by_id(&self, id: i32) -> Result<Option<Account>, StoreError>;

    /// 更新个人资料，账户不存在时返回 `None`
    async fn update_profile(
        &self,
        id: i32,
        update: ProfileUpdate,
    ) -> Result<Option<Account>, StoreError>;
}
