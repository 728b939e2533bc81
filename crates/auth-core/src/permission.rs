//! 权限规则检查
//!
//! 每种身份变体各自维护一张 EntityType -> 权限掩码的表，
//! 表用穷尽匹配写死在代码里，未授予的聚合落到空掩码（默认拒绝）。
//! 员工角色（Manager / Cashier）在基础掩码之上再叠加一层角色掩码。

use bookmart_common::{EmployeeRole, EntityType, OperationDescriptor, OperationType};
use bookmart_errors::{AppError, AppResult};

use crate::identity::DecodedIdentity;

const GET: u8 = OperationType::Get.bits();
const ADD: u8 = OperationType::Add.bits();
const UPDATE: u8 = OperationType::Update.bits();
const DELETE: u8 = OperationType::Delete.bits();
const ALL: u8 = GET | ADD | UPDATE | DELETE;

/// 权限掩码：身份对某个聚合允许的 OperationType 位或
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionMask(u8);

impl PermissionMask {
    pub const NONE: Self = Self(0);

    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// 检查通过当且仅当请求的每一位都被授予
    /// （GetOrAdd 要求 Get 和 Add 同时在掩码内）。
    pub const fn allows(self, operation: OperationType) -> bool {
        self.0 & operation.bits() == operation.bits()
    }

    /// 两层掩码叠加：两边都授予的位才保留
    pub const fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }
}

/// 顾客身份的基础权限表
fn customer_grants(entity: EntityType) -> PermissionMask {
    let bits = match entity {
        EntityType::Product => GET,
        EntityType::Book => GET,
        EntityType::Author => GET,
        EntityType::Shop => GET,
        EntityType::Order => GET | ADD | UPDATE,
        EntityType::Customer => GET | UPDATE,
        // 内部聚合对顾客不可见
        EntityType::Address => 0,
        EntityType::Warehouse => 0,
        EntityType::ProductCount => 0,
        EntityType::Employee => 0,
    };
    PermissionMask::new(bits)
}

/// 员工身份的基础权限表
fn employee_grants(entity: EntityType) -> PermissionMask {
    let bits = match entity {
        EntityType::Product => ALL,
        EntityType::Book => ALL,
        EntityType::Author => ALL,
        EntityType::Address => ALL,
        EntityType::Shop => ALL,
        EntityType::Warehouse => ALL,
        EntityType::ProductCount => ALL,
        // 订单只读和改状态，删除订单不对任何员工开放
        EntityType::Order => GET | UPDATE,
        EntityType::Customer => GET,
        EntityType::Employee => GET,
    };
    PermissionMask::new(bits)
}

/// 角色叠加掩码
fn role_grants(role: EmployeeRole, entity: EntityType) -> PermissionMask {
    let bits = match role {
        EmployeeRole::Manager => ALL,
        EmployeeRole::Cashier => match entity {
            EntityType::Product => GET,
            EntityType::Book => GET,
            EntityType::Order => GET | UPDATE,
            EntityType::ProductCount => GET | UPDATE,
            _ => 0,
        },
    };
    PermissionMask::new(bits)
}

/// 身份对应的基础掩码
fn base_mask(identity: &DecodedIdentity, entity: EntityType) -> PermissionMask {
    match identity {
        DecodedIdentity::Customer { .. } => customer_grants(entity),
        DecodedIdentity::Employee { .. } => employee_grants(entity),
    }
}

/// 检查身份是否被允许执行操作
///
/// 身份合法但权限不足时返回 Forbidden（NotEnoughRights），
/// 与认证失败严格区分。对相同输入结果恒定。
pub fn check_rule(identity: &DecodedIdentity, descriptor: OperationDescriptor) -> AppResult<()> {
    let mask = base_mask(identity, descriptor.entity);
    if mask.allows(descriptor.operation) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "{} identity has no {} permission",
            identity.kind().as_str(),
            descriptor
        )))
    }
}

/// 角色细分的二次检查
///
/// 当聚合级别的掩码不足以区分时（例如 Manager 与 Cashier），
/// 在基础掩码上叠加角色掩码，两层都授予才放行。
pub fn check_rule_for_role(
    identity: &DecodedIdentity,
    role: EmployeeRole,
    descriptor: OperationDescriptor,
) -> AppResult<()> {
    if !matches!(identity, DecodedIdentity::Employee { .. }) {
        return Err(AppError::forbidden(
            "Role-scoped rules apply to employee identities only",
        ));
    }
    let layered =
        base_mask(identity, descriptor.entity).intersect(role_grants(role, descriptor.entity));
    if layered.allows(descriptor.operation) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "{:?} role has no {} permission",
            role, descriptor
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmart_common::{CustomerId, Email, EmployeeId, Login};

    fn customer() -> DecodedIdentity {
        DecodedIdentity::Customer {
            id: CustomerId::new(),
            email: Email::new("reader@example.com").unwrap(),
        }
    }

    fn employee() -> DecodedIdentity {
        DecodedIdentity::Employee {
            id: EmployeeId::new(),
            login: Login::new("mgr1").unwrap(),
        }
    }

    #[test]
    fn test_employee_order_update_allowed() {
        // Employee:Order 掩码是 Get|Update (=5)
        let descriptor = OperationDescriptor::new(EntityType::Order, OperationType::Update);
        assert!(check_rule(&employee(), descriptor).is_ok());
    }

    #[test]
    fn test_employee_order_delete_denied() {
        // Delete 位 (8) 不在掩码 5 中
        let descriptor = OperationDescriptor::new(EntityType::Order, OperationType::Delete);
        let err = check_rule(&employee(), descriptor).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_customer_warehouse_denied_by_default() {
        let descriptor = OperationDescriptor::new(EntityType::Warehouse, OperationType::Get);
        assert!(check_rule(&customer(), descriptor).is_err());
    }

    #[test]
    fn test_get_or_add_requires_both_bits() {
        // 顾客对 Author 只有 Get，复合 GetOrAdd 必须拒绝
        let descriptor = OperationDescriptor::new(EntityType::Author, OperationType::GetOrAdd);
        assert!(check_rule(&customer(), descriptor).is_err());
        // 员工对 Author 有 Get 和 Add，复合通过
        assert!(check_rule(&employee(), descriptor).is_ok());
    }

    #[test]
    fn test_check_rule_is_deterministic() {
        let identity = employee();
        let descriptor = OperationDescriptor::new(EntityType::Order, OperationType::Delete);
        let first = check_rule(&identity, descriptor).is_ok();
        for _ in 0..10 {
            assert_eq!(check_rule(&identity, descriptor).is_ok(), first);
        }
    }

    #[test]
    fn test_role_overlay_restricts_base_mask() {
        // 员工基础掩码允许 Book:Delete，但 Cashier 角色不允许
        let descriptor = OperationDescriptor::new(EntityType::Book, OperationType::Delete);
        assert!(check_rule(&employee(), descriptor).is_ok());
        assert!(check_rule_for_role(&employee(), EmployeeRole::Cashier, descriptor).is_err());
        assert!(check_rule_for_role(&employee(), EmployeeRole::Manager, descriptor).is_ok());
    }

    #[test]
    fn test_role_overlay_never_widens_base_mask() {
        // Manager 角色掩码全开，但基础掩码没有 Order:Delete，叠加后仍拒绝
        let descriptor = OperationDescriptor::new(EntityType::Order, OperationType::Delete);
        assert!(check_rule_for_role(&employee(), EmployeeRole::Manager, descriptor).is_err());
    }

    #[test]
    fn test_role_check_rejects_customer_identity() {
        let descriptor = OperationDescriptor::new(EntityType::Book, OperationType::Get);
        assert!(check_rule_for_role(&customer(), EmployeeRole::Manager, descriptor).is_err());
    }

    #[test]
    fn test_mask_allows_composite() {
        let mask = PermissionMask::new(GET | ADD);
        assert!(mask.allows(OperationType::GetOrAdd));
        assert!(!PermissionMask::new(GET).allows(OperationType::GetOrAdd));
        assert!(!PermissionMask::new(ADD).allows(OperationType::GetOrAdd));
    }
}
