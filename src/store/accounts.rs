//! # sea-orm 账户存储

use async_trait::async_trait;
use chrono::Utc;
use entity::accounts;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, Set, SqlErr,
};
use std::sync::Arc;

use super::{Account, CredentialStore, NewAccount, ProfileUpdate, StoreError};

/// 基于 sea-orm 的账户存储
#[derive(Clone)]
pub struct SeaOrmCredentialStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmCredentialStore {
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

fn map_db_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => StoreError::UniqueViolation(message),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl CredentialStore for SeaOrmCredentialStore {
    async fn insert_account(&self, account: NewAccount) -> Result<i32, StoreError> {
        let now = Utc::now().naive_utc();
        let model = accounts::ActiveModel {
            email: Set(account.email),
            password_hash: Set(account.password_hash),
            first_name: Set(account.first_name),
            last_name: Set(account.last_name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model.insert(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(inserted.id)
    }

    async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Account::from))
    }

    async fn get_account_by_id(&self, id: i32) -> Result<Option<Account>, StoreError> {
        let model = accounts::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Account::from))
    }

    async fn update_profile(
        &self,
        id: i32,
        update: ProfileUpdate,
    ) -> Result<Option<Account>, StoreError> {
        let Some(existing) = accounts::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
        else {
            return Ok(None);
        };

        let mut model = existing.into_active_model();
        if let Some(first_name) = update.first_name {
            model.first_name = Set(Some(first_name));
        }
        if let Some(last_name) = update.last_name {
            model.last_name = Set(Some(last_name));
        }
        model.updated_at = Set(Utc::now().naive_utc());

        let updated = model.update(self.db.as_ref()).await?;
        Ok(Some(Account::from(updated)))
    }
}
