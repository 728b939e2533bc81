//! 通用类型定义
//!
//! 各聚合的强类型 ID、身份值对象（Email / Login）、
//! 以及贯穿授权链路的 EntityType / OperationType / OperationDescriptor。

use bookmart_errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 宏：定义一个基于 UUID v7 的强类型 ID
macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
        #[display("{_0}")]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

define_id!(/// 作者 ID
    AuthorId);
define_id!(/// 图书 ID
    BookId);
define_id!(/// 商品 ID
    ProductId);
define_id!(/// 库存记录 ID
    ProductCountId);
define_id!(/// 地址 ID
    AddressId);
define_id!(/// 门店 ID
    ShopId);
define_id!(/// 仓库 ID
    WarehouseId);
define_id!(/// 顾客 ID
    CustomerId);
define_id!(/// 员工 ID
    EmployeeId);
define_id!(/// 订单 ID
    OrderId);

/// Email 值对象
///
/// 构造时校验地址形状，统一小写存储。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn new(email: impl Into<String>) -> AppResult<Self> {
        let email = email.into();
        if !email_address::EmailAddress::is_valid(&email) {
            return Err(AppError::validation(format!(
                "Invalid email format: {}",
                email
            )));
        }
        Ok(Self(email.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Login 值对象
///
/// 员工登录名，非空白，3-64 个字符，仅允许字母数字、下划线和点。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Login(String);

impl Login {
    pub fn new(login: impl Into<String>) -> AppResult<Self> {
        let login = login.into();
        let trimmed = login.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("Login must not be blank"));
        }
        if trimmed.len() < 3 || trimmed.len() > 64 {
            return Err(AppError::validation(format!(
                "Login length must be 3-64 characters: {}",
                trimmed
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            return Err(AppError::validation(format!(
                "Login contains illegal characters: {}",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 员工角色
///
/// 权限二次校验（角色叠加掩码）以此为键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmployeeRole {
    Manager,
    Cashier,
}

/// 业务聚合类型（封闭枚举）
///
/// 每个入站操作都指向其中一个聚合，作为授权检查的键之一。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Product,
    Book,
    Author,
    Address,
    Shop,
    Warehouse,
    ProductCount,
    Customer,
    Employee,
    Order,
}

/// 操作类型（位标志）
///
/// 位值是契约的一部分，权限掩码按这些字面量做位运算：
/// Get=1, Add=2, Update=4, Delete=8, GetOrAdd=3。
/// 除 GetOrAdd 外不引入其它复合值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperationType {
    Get = 1,
    Add = 2,
    Update = 4,
    Delete = 8,
    /// Get | Add 复合操作（登录即注册、取或建等场景）
    GetOrAdd = 3,
}

impl OperationType {
    /// 位表示
    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// 操作描述符：(聚合类型, 操作类型)
///
/// 每个请求恰好携带一个，构造后不可变，是权限检查的完整键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationDescriptor {
    pub entity: EntityType,
    pub operation: OperationType,
}

impl OperationDescriptor {
    pub const fn new(entity: EntityType, operation: OperationType) -> Self {
        Self { entity, operation }
    }
}

impl std::fmt::Display for OperationDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}:{:?}", self.entity, self.operation)
    }
}

/// 审计信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuditInfo {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for AuditInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_type_bits() {
        assert_eq!(OperationType::Get.bits(), 1);
        assert_eq!(OperationType::Add.bits(), 2);
        assert_eq!(OperationType::Update.bits(), 4);
        assert_eq!(OperationType::Delete.bits(), 8);
        assert_eq!(OperationType::GetOrAdd.bits(), 3);
    }

    #[test]
    fn test_get_or_add_is_union() {
        assert_eq!(
            OperationType::GetOrAdd.bits(),
            OperationType::Get.bits() | OperationType::Add.bits()
        );
    }

    #[test]
    fn test_valid_email() {
        let email = Email::new("Test@Example.COM");
        assert!(email.is_ok());
        assert_eq!(email.unwrap().as_str(), "test@example.com");
    }

    #[test]
    fn test_invalid_email() {
        assert!(Email::new("not-an-email").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("").is_err());
    }

    #[test]
    fn test_valid_login() {
        let login = Login::new("mgr1");
        assert!(login.is_ok());
        assert_eq!(login.unwrap().as_str(), "mgr1");
    }

    #[test]
    fn test_blank_login() {
        assert!(Login::new("").is_err());
        assert!(Login::new("   ").is_err());
    }

    #[test]
    fn test_login_illegal_characters() {
        assert!(Login::new("mgr 1").is_err());
        assert!(Login::new("mgr-1!").is_err());
    }

    #[test]
    fn test_id_uniqueness() {
        assert_ne!(BookId::new(), BookId::new());
    }

    #[test]
    fn test_id_round_trip() {
        let id = OrderId::new();
        let parsed = OrderId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }
}
