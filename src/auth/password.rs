//! # 密码哈希
//!
//! bcrypt 哈希与校验。计算在阻塞线程池中执行，调用方在请求内等待结果。
//! 校验失败的各种路径（密码错误、哈希损坏、账户不存在）耗时一致。
//! bcrypt 只使用前 72 字节，超长密码直接拒绝而不是截断。

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::{lerror, logging::{LogComponent, LogStage}};

/// bcrypt 参与计算的最大密码字节数
pub const MAX_PASSWORD_BYTES: usize = 72;

/// 密码哈希接口
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// 生成带盐的哈希
    async fn hash(&self, plaintext: &str) -> Result<String>;

    /// 校验密码，任何内部错误都视为不匹配
    async fn verify(&self, hash: &str, plaintext: &str) -> bool;

    /// 与一次失败校验等价的空耗，用于账户不存在的登录请求
    async fn verify_dummy(&self, plaintext: &str);
}

/// bcrypt 实现
#[derive(Clone)]
pub struct BcryptHasher {
    cost: u32,
    dummy_hash: Arc<str>,
}

impl BcryptHasher {
    /// 创建哈希器，同时以相同成本生成一个占位哈希
    pub fn new(cost: u32) -> Result<Self> {
        let dummy_hash = bcrypt::hash("game-auth-dummy-password", cost)?;
        Ok(Self {
            cost,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    async fn run_verify(&self, hash: String, plaintext: String) -> bool {
        let dummy_hash = Arc::clone(&self.dummy_hash);
        let outcome = tokio::task::spawn_blocking(move || {
            match bcrypt::verify(&plaintext, &hash) {
                // 超长密码的前 72 字节可能与真实密码相同
                Ok(matched) => matched && plaintext.len() <= MAX_PASSWORD_BYTES,
                Err(_) => {
                    // 损坏的哈希也要付出一次完整比对的代价
                    let _ = bcrypt::verify(&plaintext, &dummy_hash);
                    false
                }
            }
        })
        .await;

        outcome.unwrap_or_else(|e| {
            lerror!(
                "system",
                LogStage::Authentication,
                LogComponent::Password,
                "verify_task_failed",
                &format!("密码校验任务异常: {e}")
            );
            false
        })
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    async fn hash(&self, plaintext: &str) -> Result<String> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(password_too_long());
        }

        let plaintext = plaintext.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost))
            .await
            .map_err(|e| AppError::internal_with_source("密码哈希任务异常", e))?
            .map_err(AppError::from)
    }

    async fn verify(&self, hash: &str, plaintext: &str) -> bool {
        self.run_verify(hash.to_string(), plaintext.to_string())
            .await
    }

    async fn verify_dummy(&self, plaintext: &str) {
        let _ = self
            .run_verify(self.dummy_hash.to_string(), plaintext.to_string())
            .await;
    }
}

fn password_too_long() -> AppError {
    AppError::validation(
        format!("password must be at most {MAX_PASSWORD_BYTES} bytes"),
        Some("password".to_string()),
    )
}
