//! # Game Auth Library
//!
//! 多人游戏服务器的认证与会话核心：账户注册登录、令牌签发校验、
//! 刷新令牌注册表、账户信息缓存以及受保护请求的鉴权。

pub mod api;
pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use app::AppContext;
pub use config::AppConfig;
pub use error::{AppError, Result};
