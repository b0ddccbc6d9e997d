//! # 数据库配置

use crate::error::{AppError, Result};
use crate::{linfo, logging::{LogComponent, LogStage}};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 数据库URL
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 连接超时时间（秒）
    pub connect_timeout: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/game_auth.db?mode=rwc".to_string(),
            max_connections: 10,
            connect_timeout: 30,
        }
    }
}

impl DatabaseConfig {
    /// 确保数据库路径存在（仅对SQLite文件数据库）
    pub fn ensure_database_path(&self) -> Result<()> {
        if self.url.starts_with("sqlite://") && !self.url.contains(":memory:") {
            let path_str = self
                .url
                .strip_prefix("sqlite://")
                .and_then(|rest| rest.split('?').next())
                .unwrap_or(&self.url);
            let db_path = Path::new(path_str);

            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        AppError::config_with_source(
                            format!("无法创建数据库目录: {}", parent.display()),
                            e,
                        )
                    })?;

                    linfo!(
                        "system",
                        LogStage::Startup,
                        LogComponent::Database,
                        "create_db_dir",
                        &format!("创建数据库目录: {}", parent.display())
                    );
                }
            }
        }

        Ok(())
    }
}
