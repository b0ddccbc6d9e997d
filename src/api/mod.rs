//! # HTTP API 模块
//!
//! 认证与账户的 REST 接口

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod validation;

pub use routes::create_routes;
pub use server::{ApiServer, AppState, create_router};
