//! 应用层 DTO
//!
//! 领域实体不直接出应用层边界，密码哈希等敏感字段在此被滤掉。

use bookmart_common::{AuthorId, BookId, CustomerId, OrderId, ShopId};
use bookmart_domain_core::{Book, Order, OrderStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct BookDto {
    pub id: BookId,
    pub title: String,
    pub author_id: AuthorId,
    pub price_cents: i64,
    pub currency: String,
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author_id: book.author_id,
            price_cents: book.price.amount,
            currency: book.price.currency.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDto {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub shop_id: ShopId,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            shop_id: order.shop_id,
            status: order.status,
            total_cents: order.total.amount,
            currency: order.total.currency.as_str().to_string(),
            created_at: order.audit.created_at,
        }
    }
}
