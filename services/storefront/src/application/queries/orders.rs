//! 订单查询

use async_trait::async_trait;
use bookmart_auth_core::DecodedIdentity;
use bookmart_common::{EntityType, OperationType, OrderId, OrderSorting, PagedResult, Pagination};
use bookmart_errors::{AppError, AppResult};
use bookmart_request_core::{AuthorizedProcessor, Request};
use tokio_util::sync::CancellationToken;

use crate::application::commands::orders::{OrderService, ensure_owns};
use crate::application::dto::OrderDto;
use crate::application::ensure_live;

#[derive(Debug, Clone)]
pub struct GetOrderQuery {
    pub order_id: OrderId,
}

impl Request for GetOrderQuery {
    type Result = OrderDto;
    const ENTITY: EntityType = EntityType::Order;

    fn operation(&self) -> OperationType {
        OperationType::Get
    }
}

/// 全量订单列表（员工侧）；顾客按 ID 查询自己的订单
#[derive(Debug, Clone)]
pub struct ListOrdersQuery {
    pub page: Pagination<OrderSorting>,
}

impl Request for ListOrdersQuery {
    type Result = PagedResult<OrderDto>;
    const ENTITY: EntityType = EntityType::Order;

    fn operation(&self) -> OperationType {
        OperationType::Get
    }
}

#[async_trait]
impl AuthorizedProcessor<GetOrderQuery> for OrderService {
    async fn process(
        &self,
        request: GetOrderQuery,
        identity: &DecodedIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<OrderDto> {
        ensure_live(cancel)?;
        let uow = self.uow_factory.begin().await?;
        let order = uow.orders().find_by_id(&request.order_id).await?;
        uow.rollback().await?;

        let order = order.ok_or_else(|| {
            AppError::not_found(format!("Order {} not found", request.order_id))
        })?;
        ensure_owns(identity, &order)?;

        Ok(OrderDto::from(order))
    }
}

#[async_trait]
impl AuthorizedProcessor<ListOrdersQuery> for OrderService {
    async fn process(
        &self,
        request: ListOrdersQuery,
        identity: &DecodedIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<PagedResult<OrderDto>> {
        ensure_live(cancel)?;

        if matches!(identity, DecodedIdentity::Customer { .. }) {
            return Err(AppError::forbidden(
                "Customers may only fetch their own orders by id",
            ));
        }

        let uow = self.uow_factory.begin().await?;
        let page = uow.orders().find_page(&request.page).await?;
        uow.rollback().await?;

        Ok(page.map(OrderDto::from))
    }
}
