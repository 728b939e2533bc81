//! 注册与登录命令
//!
//! 这三条操作发生在身份存在之前，走免授权管线（Processor）。
//! 登录先核对凭证再签发令牌；凭证核对失败与用户不存在
//! 返回同一个 Unauthenticated，不泄露账号是否存在。

use std::sync::Arc;

use async_trait::async_trait;
use bookmart_auth_core::{AuthenticatedUser, DecodedIdentity, TokenService};
use bookmart_common::{CustomerId, Email, EmployeeId, EntityType, Login, OperationType};
use bookmart_domain_core::Customer;
use bookmart_errors::AppResult;
use bookmart_ports::UnitOfWorkFactory;
use bookmart_request_core::{Processor, Request};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::ensure_live;
use crate::error::AuthFlowError;

/// 顾客注册
#[derive(Debug, Clone)]
pub struct RegisterCustomerCommand {
    pub email: String,
    pub password: String,
}

impl Request for RegisterCustomerCommand {
    type Result = CustomerId;
    const ENTITY: EntityType = EntityType::Customer;

    fn operation(&self) -> OperationType {
        OperationType::Add
    }
}

/// 顾客登录
#[derive(Debug, Clone)]
pub struct LoginCustomerCommand {
    pub email: String,
    pub password: String,
}

impl Request for LoginCustomerCommand {
    type Result = AuthenticatedUser<CustomerId>;
    const ENTITY: EntityType = EntityType::Customer;

    fn operation(&self) -> OperationType {
        OperationType::Get
    }
}

/// 员工登录
#[derive(Debug, Clone)]
pub struct LoginEmployeeCommand {
    pub login: String,
    pub password: String,
}

impl Request for LoginEmployeeCommand {
    type Result = AuthenticatedUser<EmployeeId>;
    const ENTITY: EntityType = EntityType::Employee;

    fn operation(&self) -> OperationType {
        OperationType::Get
    }
}

/// 认证服务
pub struct AuthService {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>, tokens: Arc<TokenService>) -> Self {
        Self { uow_factory, tokens }
    }
}

#[async_trait]
impl Processor<RegisterCustomerCommand> for AuthService {
    async fn process(
        &self,
        request: RegisterCustomerCommand,
        cancel: &CancellationToken,
    ) -> AppResult<CustomerId> {
        let email = Email::new(request.email)?;

        let uow = self.uow_factory.begin().await?;

        if uow.customers().find_by_email(&email).await?.is_some() {
            uow.rollback().await?;
            return Err(AuthFlowError::EmailTaken.into());
        }

        let customer = Customer::register(email, &request.password)?;
        let id = customer.id;
        uow.customers().save(&customer).await?;

        if let Err(e) = ensure_live(cancel) {
            uow.rollback().await?;
            return Err(e);
        }
        uow.commit().await?;

        info!(customer_id = %id, "Customer registered");
        Ok(id)
    }
}

#[async_trait]
impl Processor<LoginCustomerCommand> for AuthService {
    async fn process(
        &self,
        request: LoginCustomerCommand,
        cancel: &CancellationToken,
    ) -> AppResult<AuthenticatedUser<CustomerId>> {
        ensure_live(cancel)?;
        let email = Email::new(request.email)?;

        let uow = self.uow_factory.begin().await?;
        let customer = uow.customers().find_by_email(&email).await?;
        uow.rollback().await?;

        let customer = customer.ok_or(AuthFlowError::InvalidCredentials)?;
        if !customer.password_hash.verify(&request.password) {
            return Err(AuthFlowError::InvalidCredentials.into());
        }

        let identity = DecodedIdentity::Customer {
            id: customer.id,
            email: customer.email,
        };
        let token = self.tokens.issue(&identity)?;

        info!(customer_id = %customer.id, "Customer logged in");
        Ok(AuthenticatedUser::new(token, customer.id))
    }
}

#[async_trait]
impl Processor<LoginEmployeeCommand> for AuthService {
    async fn process(
        &self,
        request: LoginEmployeeCommand,
        cancel: &CancellationToken,
    ) -> AppResult<AuthenticatedUser<EmployeeId>> {
        ensure_live(cancel)?;
        let login = Login::new(request.login)?;

        let uow = self.uow_factory.begin().await?;
        let employee = uow.employees().find_by_login(&login).await?;
        uow.rollback().await?;

        let employee = employee.ok_or(AuthFlowError::InvalidCredentials)?;
        if !employee.password_hash.verify(&request.password) {
            return Err(AuthFlowError::InvalidCredentials.into());
        }

        let identity = DecodedIdentity::Employee {
            id: employee.id,
            login: employee.login,
        };
        let token = self.tokens.issue(&identity)?;

        info!(employee_id = %employee.id, "Employee logged in");
        Ok(AuthenticatedUser::new(token, employee.id))
    }
}
