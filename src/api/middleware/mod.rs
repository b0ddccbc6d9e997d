//! # API中间件

pub mod auth;
pub mod request_id;

pub use auth::auth_gate;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
