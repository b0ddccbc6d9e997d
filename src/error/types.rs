//! # 错误类型定义

use axum::http::StatusCode;
use thiserror::Error;

use super::ErrorCategory;

/// 对外暴露的服务端错误提示，不泄露内部细节
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// 应用主要错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 数据库相关错误
    #[error("数据库错误: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 缓存相关错误
    #[error("缓存错误: {message}")]
    Cache {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 序列化/反序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// 系统内部错误
    #[error("内部错误: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 资源在存储中不存在（服务端一致性问题）
    #[error("资源未找到: {resource_type} {identifier}")]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    /// 资源冲突，例如重复注册
    #[error("{message}")]
    Conflict { message: String },

    /// 未认证或凭证无效
    #[error("{message}")]
    Unauthorized { message: String },

    /// 请求参数校验失败
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// 附加了上下文的错误
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// 将错误转换为HTTP状态码和错误代码
    #[must_use]
    pub fn to_http_response_parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Conflict { .. } => (StatusCode::CONFLICT, "RESOURCE_CONFLICT"),
            Self::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::Config { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Self::Database { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Self::Cache { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "CACHE_ERROR"),
            Self::Serialization { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR")
            }
            Self::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::NotFound { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "RESOURCE_NOT_FOUND"),
            Self::Context { source, .. } => source.to_http_response_parts(),
        }
    }

    /// 错误归类：客户端错误或服务端错误
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Conflict { .. } | Self::Unauthorized { .. } | Self::Validation { .. } => {
                ErrorCategory::Client
            }
            Self::Context { source, .. } => source.category(),
            _ => ErrorCategory::Server,
        }
    }

    /// 返回给调用方的错误描述
    ///
    /// 客户端错误原样返回，服务端错误统一为通用提示。
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Conflict { message }
            | Self::Unauthorized { message }
            | Self::Validation { message, .. } => message.clone(),
            Self::Context { source, .. } => source.public_message(),
            _ => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建数据库错误
    pub fn database<T: Into<String>>(message: T) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的数据库错误
    pub fn database_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建缓存错误
    pub fn cache<T: Into<String>>(message: T) -> Self {
        Self::Cache {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的缓存错误
    pub fn cache_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Cache {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建序列化错误
    pub fn serialization<T: Into<String>, E: Into<anyhow::Error>>(message: T, source: E) -> Self {
        Self::Serialization {
            message: message.into(),
            source: source.into(),
        }
    }

    /// 创建内部错误
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的内部错误
    pub fn internal_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建资源未找到错误
    pub fn not_found<T: Into<String>, I: Into<String>>(resource_type: T, identifier: I) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            identifier: identifier.into(),
        }
    }

    /// 创建资源冲突错误
    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// 创建未认证错误
    pub fn unauthorized<T: Into<String>>(message: T) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// 创建参数校验错误
    pub fn validation<T: Into<String>>(message: T, field: Option<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field,
        }
    }
}

// 自动转换常见错误类型
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal_with_source("文件操作失败", err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("JSON处理失败", err)
    }
}

impl From<sea_orm::error::DbErr> for AppError {
    fn from(err: sea_orm::error::DbErr) -> Self {
        Self::database_with_source("数据库操作失败", err)
    }
}

// Redis错误转换
impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        Self::cache_with_source("Redis操作失败", err)
    }
}

// Bcrypt错误转换
impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::internal_with_source("密码处理失败", err)
    }
}

// JWT错误转换
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::internal_with_source("JWT处理失败", err)
    }
}
