//! 解码后的身份

use bookmart_common::{CustomerId, Email, EmployeeId, Login};
use serde::{Deserialize, Serialize};

use crate::token::AuthToken;

/// 身份种类标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityKind {
    Customer,
    Employee,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Employee => "employee",
        }
    }
}

/// 从凭证令牌中恢复出的结构化身份
///
/// 变体标签在解码时即固定，之后不会被重释为另一种变体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodedIdentity {
    Customer { id: CustomerId, email: Email },
    Employee { id: EmployeeId, login: Login },
}

impl DecodedIdentity {
    pub fn kind(&self) -> IdentityKind {
        match self {
            Self::Customer { .. } => IdentityKind::Customer,
            Self::Employee { .. } => IdentityKind::Employee,
        }
    }
}

/// 认证结果：令牌与认证者的强类型 ID 成对返回
///
/// 登录操作用它把新签发的令牌连同用户 ID 一起交还给调用方。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser<I> {
    pub token: AuthToken,
    pub user_id: I,
}

impl<I> AuthenticatedUser<I> {
    pub fn new(token: AuthToken, user_id: I) -> Self {
        Self { token, user_id }
    }
}
