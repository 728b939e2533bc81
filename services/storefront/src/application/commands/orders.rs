//! 订单状态流转命令
//!
//! 订单的可见性带所有权细分：顾客只能动自己的订单，
//! 员工不受此限制。终态订单拒绝再流转（领域层 Conflict）。

use std::sync::Arc;

use async_trait::async_trait;
use bookmart_auth_core::DecodedIdentity;
use bookmart_common::{EntityType, OperationType, OrderId};
use bookmart_domain_core::{Order, OrderStatus};
use bookmart_errors::{AppError, AppResult};
use bookmart_ports::UnitOfWorkFactory;
use bookmart_request_core::{AuthorizedProcessor, Request};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::ensure_live;

#[derive(Debug, Clone)]
pub struct UpdateOrderStatusCommand {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

impl Request for UpdateOrderStatusCommand {
    type Result = ();
    const ENTITY: EntityType = EntityType::Order;

    fn operation(&self) -> OperationType {
        OperationType::Update
    }
}

/// 订单服务
pub struct OrderService {
    pub(crate) uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl OrderService {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }
}

/// 所有权细分：规则检查放行后仍须是本人的订单
pub(crate) fn ensure_owns(identity: &DecodedIdentity, order: &Order) -> AppResult<()> {
    match identity {
        DecodedIdentity::Customer { id, .. } if *id != order.customer_id => Err(
            AppError::forbidden(format!("Order {} belongs to another customer", order.id)),
        ),
        _ => Ok(()),
    }
}

#[async_trait]
impl AuthorizedProcessor<UpdateOrderStatusCommand> for OrderService {
    async fn process(
        &self,
        request: UpdateOrderStatusCommand,
        identity: &DecodedIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        let uow = self.uow_factory.begin().await?;

        let mut order = match uow.orders().find_by_id(&request.order_id).await? {
            Some(order) => order,
            None => {
                uow.rollback().await?;
                return Err(AppError::not_found(format!(
                    "Order {} not found",
                    request.order_id
                )));
            }
        };

        if let Err(e) = ensure_owns(identity, &order) {
            uow.rollback().await?;
            return Err(e);
        }

        // 顾客侧唯一允许的流转是取消
        if matches!(identity, DecodedIdentity::Customer { .. })
            && request.status != OrderStatus::Cancelled
        {
            uow.rollback().await?;
            return Err(AppError::forbidden(
                "Customers may only cancel their own orders",
            ));
        }

        if let Err(e) = order.set_status(request.status) {
            uow.rollback().await?;
            return Err(e);
        }
        uow.orders().save(&order).await?;

        if let Err(e) = ensure_live(cancel) {
            uow.rollback().await?;
            return Err(e);
        }
        uow.commit().await?;

        info!(order_id = %request.order_id, status = ?request.status, "Order status updated");
        Ok(())
    }
}
