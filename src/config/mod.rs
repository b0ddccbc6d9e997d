//! # 配置管理模块
//!
//! 处理应用配置加载、环境变量覆盖和验证

mod app_config;
mod database;

pub use app_config::{
    AppConfig, AuthConfig, CacheConfig, CacheType, MIN_PRODUCTION_SECRET_LEN, RedisConfig,
    ServerConfig,
};
pub use database::DatabaseConfig;

use crate::error::{AppError, Context, Result};
use crate::{linfo, logging::{LogComponent, LogStage}};
use std::env;
use std::path::{Path, PathBuf};

/// 加载配置
///
/// 显式指定的文件必须存在；否则尝试 `config/config.{RUST_ENV}.toml`，
/// 不存在时使用默认值。随后应用环境变量覆盖并校验。
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(AppError::config(format!(
                    "配置文件不存在: {}",
                    path.display()
                )));
            }
            read_config_file(path)?
        }
        None => {
            let path = default_config_path();
            if path.exists() {
                read_config_file(&path)?
            } else {
                linfo!(
                    "system",
                    LogStage::Configuration,
                    LogComponent::Config,
                    "use_default_config",
                    &format!("配置文件 {} 不存在，使用默认配置", path.display())
                );
                AppConfig::default()
            }
        }
    };

    config.apply_env_overrides(|key| env::var(key).ok())?;
    config.validate()?;

    Ok(config)
}

fn default_config_path() -> PathBuf {
    let env = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
    PathBuf::from(format!("config/config.{env}.toml"))
}

fn read_config_file(path: &Path) -> Result<AppConfig> {
    let config_content = std::fs::read_to_string(path).map_err(|e| {
        AppError::config_with_source(format!("读取配置文件失败: {}", path.display()), e)
    })?;

    let config: AppConfig = toml::from_str(&config_content)
        .with_context(|| format!("解析配置文件失败: {}", path.display()))?;

    linfo!(
        "system",
        LogStage::Configuration,
        LogComponent::Config,
        "config_loaded",
        &format!("已加载配置文件: {}", path.display())
    );

    Ok(config)
}
