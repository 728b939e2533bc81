//! 分页与排序描述符
//!
//! 排序键到 EntityType 的映射是静态全映射：每个排序枚举通过
//! `SortKey::ENTITY` 在编译期绑定到唯一的聚合类型，
//! 遗漏由编译器和测试共同兜底，而不是运行时字典。

use bookmart_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::types::EntityType;

/// 排序键 trait
///
/// `ENTITY` 把排序枚举静态绑定到它所描述的聚合；
/// `order_by` 给出持久化层使用的排序列。
pub trait SortKey: Copy + Send + Sync + 'static {
    const ENTITY: EntityType;

    fn order_by(&self) -> &'static str;
}

/// 作者排序键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorSorting {
    FirstName,
    LastName,
}

impl SortKey for AuthorSorting {
    const ENTITY: EntityType = EntityType::Author;

    fn order_by(&self) -> &'static str {
        match self {
            Self::FirstName => "authors.first_name",
            Self::LastName => "authors.last_name",
        }
    }
}

/// 图书排序键
///
/// 除本表字段外还支持按关联作者的全名排序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookSorting {
    Title,
    Price,
    AuthorFullName,
}

impl SortKey for BookSorting {
    const ENTITY: EntityType = EntityType::Book;

    fn order_by(&self) -> &'static str {
        match self {
            Self::Title => "books.title",
            Self::Price => "books.price_cents",
            Self::AuthorFullName => "(authors.first_name || ' ' || authors.last_name)",
        }
    }
}

/// 顾客排序键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerSorting {
    Email,
}

impl SortKey for CustomerSorting {
    const ENTITY: EntityType = EntityType::Customer;

    fn order_by(&self) -> &'static str {
        match self {
            Self::Email => "customers.email",
        }
    }
}

/// 员工排序键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeSorting {
    Login,
    Name,
}

impl SortKey for EmployeeSorting {
    const ENTITY: EntityType = EntityType::Employee;

    fn order_by(&self) -> &'static str {
        match self {
            Self::Login => "employees.login",
            Self::Name => "employees.name",
        }
    }
}

/// 订单排序键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSorting {
    CreatedAt,
    Total,
}

impl SortKey for OrderSorting {
    const ENTITY: EntityType = EntityType::Order;

    fn order_by(&self) -> &'static str {
        match self {
            Self::CreatedAt => "orders.created_at",
            Self::Total => "orders.total_cents",
        }
    }
}

/// 库存排序键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCountSorting {
    Count,
}

impl SortKey for ProductCountSorting {
    const ENTITY: EntityType = EntityType::ProductCount;

    fn order_by(&self) -> &'static str {
        match self {
            Self::Count => "product_counts.count",
        }
    }
}

/// 商品排序键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductSorting {
    Name,
    Price,
}

impl SortKey for ProductSorting {
    const ENTITY: EntityType = EntityType::Product;

    fn order_by(&self) -> &'static str {
        match self {
            Self::Name => "products.name",
            Self::Price => "products.price_cents",
        }
    }
}

/// 门店排序键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShopSorting {
    Name,
}

impl SortKey for ShopSorting {
    const ENTITY: EntityType = EntityType::Shop;

    fn order_by(&self) -> &'static str {
        match self {
            Self::Name => "shops.name",
        }
    }
}

/// 仓库排序键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarehouseSorting {
    Name,
}

impl SortKey for WarehouseSorting {
    const ENTITY: EntityType = EntityType::Warehouse;

    fn order_by(&self) -> &'static str {
        match self {
            Self::Name => "warehouses.name",
        }
    }
}

/// 分页参数
///
/// 页码和页大小都从 1 起算，构造时校验，越界立即失败而不是静默夹紧。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination<S: SortKey> {
    page: u32,
    page_size: u32,
    sort: S,
}

impl<S: SortKey> Pagination<S> {
    pub fn new(page: u32, page_size: u32, sort: S) -> AppResult<Self> {
        if page < 1 {
            return Err(AppError::validation(format!(
                "Page number must be >= 1, got {}",
                page
            )));
        }
        if page_size < 1 {
            return Err(AppError::validation(format!(
                "Page size must be >= 1, got {}",
                page_size
            )));
        }
        Ok(Self {
            page,
            page_size,
            sort,
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort(&self) -> S {
        self.sort
    }

    /// 此分页所描述的聚合类型
    pub const fn entity() -> EntityType {
        S::ENTITY
    }

    /// 跳过的记录数，在 u64 中计算以免 page * page_size 溢出 u32
    pub fn offset(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.page_size)
    }
}

/// 分页结果
///
/// 字段私有，只能经由 [`PagedResult::new`] 从已校验的 [`Pagination`] 构造,
/// 因此 page_size 恒 >= 1，total_pages 不会除零。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    items: Vec<T>,
    total: u64,
    page: u32,
    page_size: u32,
}

impl<T> PagedResult<T> {
    pub fn new<S: SortKey>(items: Vec<T>, total: u64, pagination: &Pagination<S>) -> Self {
        Self {
            items,
            total,
            page: pagination.page(),
            page_size: pagination.page_size(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.page_size))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(Pagination::new(1, 0, BookSorting::Title).is_err());
    }

    #[test]
    fn test_zero_page_number_rejected() {
        assert!(Pagination::new(0, 1, BookSorting::Title).is_err());
    }

    #[test]
    fn test_minimal_pagination_accepted() {
        let page = Pagination::new(1, 1, BookSorting::Title).unwrap();
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn test_offset() {
        let page = Pagination::new(3, 20, OrderSorting::CreatedAt).unwrap();
        assert_eq!(page.offset(), 40);
    }

    /// 极端页码下偏移量不得溢出
    #[test]
    fn test_offset_of_huge_page_does_not_overflow() {
        let page = Pagination::new(u32::MAX, 2, BookSorting::Title).unwrap();
        assert_eq!(page.offset(), (u64::from(u32::MAX) - 1) * 2);

        let page = Pagination::new(u32::MAX, u32::MAX, BookSorting::Title).unwrap();
        assert_eq!(
            page.offset(),
            (u64::from(u32::MAX) - 1) * u64::from(u32::MAX)
        );
    }

    #[test]
    fn test_paged_result_carries_pagination_fields() {
        let page = Pagination::new(2, 10, BookSorting::Title).unwrap();
        let result = PagedResult::new(vec![1, 2, 3], 23, &page);
        assert_eq!(result.items(), &[1, 2, 3]);
        assert_eq!(result.total(), 23);
        assert_eq!(result.page(), 2);
        assert_eq!(result.page_size(), 10);
        assert_eq!(result.total_pages(), 3);
    }

    /// 排序键 → 聚合类型映射必须与约定表逐项一致
    #[test]
    fn test_sort_key_entity_mapping_is_total() {
        assert_eq!(AuthorSorting::ENTITY, EntityType::Author);
        assert_eq!(BookSorting::ENTITY, EntityType::Book);
        assert_eq!(CustomerSorting::ENTITY, EntityType::Customer);
        assert_eq!(EmployeeSorting::ENTITY, EntityType::Employee);
        assert_eq!(OrderSorting::ENTITY, EntityType::Order);
        assert_eq!(ProductCountSorting::ENTITY, EntityType::ProductCount);
        assert_eq!(ProductSorting::ENTITY, EntityType::Product);
        assert_eq!(ShopSorting::ENTITY, EntityType::Shop);
        assert_eq!(WarehouseSorting::ENTITY, EntityType::Warehouse);
    }

    #[test]
    fn test_book_sorting_by_joined_author_name() {
        assert!(BookSorting::AuthorFullName.order_by().contains("authors."));
    }

    #[test]
    fn test_total_pages() {
        let page = Pagination::new(1, 10, ShopSorting::Name).unwrap();
        let result = PagedResult::new(vec![1, 2, 3], 21, &page);
        assert_eq!(result.total_pages(), 3);
    }
}
