//! # 认证模块
//!
//! 注册登录、令牌签发校验、账户解析和请求鉴权。此模块只暴露组件化服务
//! (`CredentialService`, `AuthGate`, `AccountResolver`) 以及核心数据结构，
//! 其余实现需通过子模块路径访问。

pub mod account;
pub mod gate;
pub mod jwt;
pub mod password;
pub mod service;
pub mod types;
pub mod utils;

pub use account::AccountResolver;
pub use gate::AuthGate;
pub use jwt::TokenIssuer;
pub use password::{BcryptHasher, PasswordHasher};
pub use service::CredentialService;
pub use types::{
    ACCOUNT_EXISTS, AuthenticatedAccount, INVALID_CREDENTIALS, LoginInput, LoginOutput,
    MISSING_AUTHORIZATION, RefreshOutput, RegisterInput, TOKEN_INVALID,
};
