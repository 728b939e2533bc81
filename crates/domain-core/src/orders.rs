//! 订单聚合

use bookmart_common::{AuditInfo, CustomerId, OrderId, ShopId};
use bookmart_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::entity::{AggregateRoot, Entity};
use crate::money::Money;

/// 订单状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Placed,
    Paid,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// 终态之后不允许再变更
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// 订单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub shop_id: ShopId,
    pub status: OrderStatus,
    pub total: Money,
    pub audit: AuditInfo,
}

impl Order {
    pub fn place(customer_id: CustomerId, shop_id: ShopId, total: Money) -> AppResult<Self> {
        if !total.is_positive() {
            return Err(AppError::validation("Order total must be positive"));
        }
        Ok(Self {
            id: OrderId::new(),
            customer_id,
            shop_id,
            status: OrderStatus::Placed,
            total,
            audit: AuditInfo::new(),
        })
    }

    pub fn set_status(&mut self, status: OrderStatus) -> AppResult<()> {
        if self.status.is_terminal() {
            return Err(AppError::conflict(format!(
                "Order {} is already {:?}",
                self.id, self.status
            )));
        }
        self.status = status;
        self.audit.touch();
        Ok(())
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &OrderId {
        &self.id
    }
}

impl AggregateRoot for Order {
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
    fn test_new_order_is_placed() {
        let order = Order::place(CustomerId::new(), ShopId::new(), Money::usd(1999)).unwrap();
        assert_eq!(order.status, OrderStatus::Placed);
    }

    #[test]
    fn test_terminal_status_is_frozen() {
        let mut order = Order::place(CustomerId::new(), ShopId::new(), Money::usd(1999)).unwrap();
        order.set_status(OrderStatus::Cancelled).unwrap();
        assert!(order.set_status(OrderStatus::Paid).is_err());
    }

    #[test]
    fn test_zero_total_rejected() {
        assert!(Order::place(CustomerId::new(), ShopId::new(), Money::usd(0)).is_err());
    }
}
