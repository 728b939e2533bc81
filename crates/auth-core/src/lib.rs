//! bookmart-auth-core - 认证核心库
//!
//! 令牌编解码（JWT）、身份变体与权限规则检查。

pub mod identity;
pub mod permission;
pub mod token;

pub use identity::*;
pub use permission::*;
pub use token::*;
