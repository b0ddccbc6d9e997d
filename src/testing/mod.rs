//! # 测试框架模块
//!
//! 提供测试工具、内存实现和 Mock 对象

pub mod helpers;
pub mod mocks;

pub use helpers::*;
pub use mocks::*;
