//! 参与方聚合：顾客、员工

use bookmart_common::{AuditInfo, CustomerId, Email, EmployeeId, EmployeeRole, Login};
use bookmart_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::entity::{AggregateRoot, Entity};
use crate::password::PasswordHash;

/// 顾客
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub email: Email,
    pub password_hash: PasswordHash,
    pub audit: AuditInfo,
}

impl Customer {
    pub fn register(email: Email, password: &str) -> AppResult<Self> {
        Ok(Self {
            id: CustomerId::new(),
            email,
            password_hash: PasswordHash::hash(password)?,
            audit: AuditInfo::new(),
        })
    }
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &CustomerId {
        &self.id
    }
}

impl AggregateRoot for Customer {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}

/// 员工
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub login: Login,
    pub name: String,
    pub role: EmployeeRole,
    pub password_hash: PasswordHash,
    pub audit: AuditInfo,
}

impl Employee {
    pub fn new(
        login: Login,
        name: impl Into<String>,
        role: EmployeeRole,
        password: &str,
    ) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::validation("Employee name must not be blank"));
        }
        Ok(Self {
            id: EmployeeId::new(),
            login,
            name,
            role,
            password_hash: PasswordHash::hash(password)?,
            audit: AuditInfo::new(),
        })
    }
}

impl Entity for Employee {
    type Id = EmployeeId;

    fn id(&self) -> &EmployeeId {
        &self.id
    }
}

impl AggregateRoot for Employee {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_register_hashes_password() {
        let customer =
            Customer::register(Email::new("reader@example.com").unwrap(), "letmein-please")
                .unwrap();
        assert!(customer.password_hash.verify("letmein-please"));
        assert!(!customer.password_hash.verify("other"));
    }

    #[test]
    fn test_employee_blank_name_rejected() {
        let result = Employee::new(
            Login::new("mgr1").unwrap(),
            " ",
            EmployeeRole::Manager,
            "letmein-please",
        );
        assert!(result.is_err());
    }
}
