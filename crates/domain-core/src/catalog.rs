//! 商品目录聚合：作者、图书、商品、库存

use bookmart_common::{
    AuditInfo, AuthorId, BookId, ProductCountId, ProductId, WarehouseId,
};
use bookmart_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::entity::{AggregateRoot, Entity};
use crate::money::Money;

/// 作者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub first_name: String,
    pub last_name: String,
    pub audit: AuditInfo,
}

impl Author {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> AppResult<Self> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        if first_name.trim().is_empty() || last_name.trim().is_empty() {
            return Err(AppError::validation("Author name parts must not be blank"));
        }
        Ok(Self {
            id: AuthorId::new(),
            first_name,
            last_name,
            audit: AuditInfo::new(),
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Author {
    type Id = AuthorId;

    fn id(&self) -> &AuthorId {
        &self.id
    }
}

impl AggregateRoot for Author {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}

/// 图书
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author_id: AuthorId,
    pub price: Money,
    pub audit: AuditInfo,
}

impl Book {
    pub fn new(title: impl Into<String>, author_id: AuthorId, price: Money) -> AppResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(AppError::validation("Book title must not be blank"));
        }
        if !price.is_positive() {
            return Err(AppError::validation("Book price must be positive"));
        }
        Ok(Self {
            id: BookId::new(),
            title,
            author_id,
            price,
            audit: AuditInfo::new(),
        })
    }

    pub fn reprice(&mut self, price: Money) -> AppResult<()> {
        if !price.is_positive() {
            return Err(AppError::validation("Book price must be positive"));
        }
        self.price = price;
        self.audit.touch();
        Ok(())
    }

    pub fn rename(&mut self, title: impl Into<String>) -> AppResult<()> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(AppError::validation("Book title must not be blank"));
        }
        self.title = title;
        self.audit.touch();
        Ok(())
    }
}

impl Entity for Book {
    type Id = BookId;

    fn id(&self) -> &BookId {
        &self.id
    }
}

impl AggregateRoot for Book {
    fn audit_info(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_info_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}

/// 商品（图书之外的普通货品）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub audit: AuditInfo,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Money) -> AppResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AppError::validation("Product name must not be blank"));
        }
        Ok(Self {
            id: ProductId::new(),
            name,
            price,
            audit: AuditInfo::new(),
        })
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.id
    }
}

/// 某仓库中某商品的库存数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCount {
    pub id: ProductCountId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub count: i64,
}

impl ProductCount {
    pub fn new(product_id: ProductId, warehouse_id: WarehouseId, count: i64) -> AppResult<Self> {
        if count < 0 {
            return Err(AppError::validation("Stock count must not be negative"));
        }
        Ok(Self {
            id: ProductCountId::new(),
            product_id,
            warehouse_id,
            count,
        })
    }

    pub fn set_count(&mut self, count: i64) -> AppResult<()> {
        if count < 0 {
            return Err(AppError::validation("Stock count must not be negative"));
        }
        self.count = count;
        Ok(())
    }
}

impl Entity for ProductCount {
    type Id = ProductCountId;

    fn id(&self) -> &ProductCountId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_full_name() {
        let author = Author::new("Ursula", "Le Guin").unwrap();
        assert_eq!(author.full_name(), "Ursula Le Guin");
    }

    #[test]
    fn test_blank_author_rejected() {
        assert!(Author::new("", "Le Guin").is_err());
        assert!(Author::new("Ursula", "  ").is_err());
    }

    #[test]
    fn test_book_price_must_be_positive() {
        let author = Author::new("Ursula", "Le Guin").unwrap();
        assert!(Book::new("The Dispossessed", author.id, Money::usd(0)).is_err());
        assert!(Book::new("The Dispossessed", author.id, Money::usd(1999)).is_ok());
    }

    #[test]
    fn test_negative_stock_rejected() {
        let result = ProductCount::new(ProductId::new(), WarehouseId::new(), -1);
        assert!(result.is_err());
    }
}
