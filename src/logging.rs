//! # 日志系统
//!
//! 基于 `tracing` 的结构化日志。每条日志都带有请求标识、阶段、组件和操作名，
//! 通过 `linfo!` / `lwarn!` / `lerror!` / `ldebug!` 宏统一输出。

use std::fmt;
use tracing_subscriber::{EnvFilter, fmt as tracing_fmt};

/// 日志阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStage {
    Startup,
    Shutdown,
    Configuration,
    Db,
    Cache,
    Authentication,
    RequestStart,
    Response,
    Error,
    Internal,
}

impl LogStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Configuration => "configuration",
            Self::Db => "db",
            Self::Cache => "cache",
            Self::Authentication => "authentication",
            Self::RequestStart => "request_start",
            Self::Response => "response",
            Self::Error => "error",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for LogStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 日志组件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogComponent {
    Main,
    ServerSetup,
    Config,
    Database,
    Cache,
    Session,
    Auth,
    Jwt,
    Password,
    Account,
    Api,
}

impl LogComponent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::ServerSetup => "server_setup",
            Self::Config => "config",
            Self::Database => "database",
            Self::Cache => "cache",
            Self::Session => "session",
            Self::Auth => "auth",
            Self::Jwt => "jwt",
            Self::Password => "password",
            Self::Account => "account",
            Self::Api => "api",
        }
    }
}

impl fmt::Display for LogComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 初始化全局日志订阅者
///
/// `RUST_LOG` 优先，否则使用传入的级别。重复初始化时静默忽略，便于测试。
pub fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));

    let _ = tracing_fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 信息级别结构化日志
#[macro_export]
macro_rules! linfo {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::info!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($key = ?$value,)*
            "{}",
            $message
        )
    };
}

/// 警告级别结构化日志
#[macro_export]
macro_rules! lwarn {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::warn!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($key = ?$value,)*
            "{}",
            $message
        )
    };
}

/// 错误级别结构化日志
#[macro_export]
macro_rules! lerror {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::error!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($key = ?$value,)*
            "{}",
            $message
        )
    };
}

/// 调试级别结构化日志
#[macro_export]
macro_rules! ldebug {
    ($request_id:expr, $stage:expr, $component:expr, $operation:expr, $message:expr $(, $key:ident = $value:expr)* $(,)?) => {
        ::tracing::debug!(
            request_id = %$request_id,
            stage = %$stage,
            component = %$component,
            operation = $operation,
            $($key = ?$value,)*
            "{}",
            $message
        )
    };
}
