//! 各聚合的 Repository trait 定义
//!
//! 统一形状：`find_by_id` 未命中返回 None（由应用层决定是否升级为
//! NotFound），`exists` 在其上提供默认实现，`save` 是幂等 upsert，
//! `delete` 对不存在的 id 返回 NotFound，列表操作接收对应聚合的
//! 分页描述符。

use async_trait::async_trait;
use bookmart_common::{
    AddressId, AuthorId, AuthorSorting, BookId, BookSorting, CustomerId, CustomerSorting, Email,
    EmployeeId, EmployeeSorting, Login, OrderId, OrderSorting, PagedResult, Pagination,
    ProductCountSorting, ProductId, ProductSorting, ShopId, ShopSorting, WarehouseId,
    WarehouseSorting,
};
use bookmart_errors::AppResult;
use bookmart_domain_core::{
    Address, Author, Book, Customer, Employee, Order, Product, ProductCount, Shop, Warehouse,
};

/// 作者 Repository
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn find_by_id(&self, id: &AuthorId) -> AppResult<Option<Author>>;

    async fn exists(&self, id: &AuthorId) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// 按姓名精确查找（GetOrAdd 场景）
    async fn find_by_name(&self, first_name: &str, last_name: &str) -> AppResult<Option<Author>>;

    async fn save(&self, author: &Author) -> AppResult<()>;

    async fn delete(&self, id: &AuthorId) -> AppResult<()>;

    async fn find_page(&self, page: &Pagination<AuthorSorting>) -> AppResult<PagedResult<Author>>;
}

/// 图书 Repository
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_by_id(&self, id: &BookId) -> AppResult<Option<Book>>;

    async fn exists(&self, id: &BookId) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn save(&self, book: &Book) -> AppResult<()>;

    async fn delete(&self, id: &BookId) -> AppResult<()>;

    async fn find_page(&self, page: &Pagination<BookSorting>) -> AppResult<PagedResult<Book>>;
}

/// 顾客 Repository
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_id(&self, id: &CustomerId) -> AppResult<Option<Customer>>;

    async fn exists(&self, id: &CustomerId) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<Option<Customer>>;

    async fn save(&self, customer: &Customer) -> AppResult<()>;

    async fn delete(&self, id: &CustomerId) -> AppResult<()>;

    async fn find_page(
        &self,
        page: &Pagination<CustomerSorting>,
    ) -> AppResult<PagedResult<Customer>>;
}

/// 员工 Repository
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_by_id(&self, id: &EmployeeId) -> AppResult<Option<Employee>>;

    async fn exists(&self, id: &EmployeeId) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn find_by_login(&self, login: &Login) -> AppResult<Option<Employee>>;

    async fn save(&self, employee: &Employee) -> AppResult<()>;

    async fn delete(&self, id: &EmployeeId) -> AppResult<()>;

    async fn find_page(
        &self,
        page: &Pagination<EmployeeSorting>,
    ) -> AppResult<PagedResult<Employee>>;
}

/// 订单 Repository
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: &OrderId) -> AppResult<Option<Order>>;

    async fn exists(&self, id: &OrderId) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn save(&self, order: &Order) -> AppResult<()>;

    async fn delete(&self, id: &OrderId) -> AppResult<()>;

    async fn find_page(&self, page: &Pagination<OrderSorting>) -> AppResult<PagedResult<Order>>;
}

/// 商品 Repository
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> AppResult<Option<Product>>;

    async fn exists(&self, id: &ProductId) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn save(&self, product: &Product) -> AppResult<()>;

    async fn delete(&self, id: &ProductId) -> AppResult<()>;

    async fn find_page(&self, page: &Pagination<ProductSorting>)
    -> AppResult<PagedResult<Product>>;
}

/// 门店 Repository
#[async_trait]
pub trait ShopRepository: Send + Sync {
    async fn find_by_id(&self, id: &ShopId) -> AppResult<Option<Shop>>;

    async fn exists(&self, id: &ShopId) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn save(&self, shop: &Shop) -> AppResult<()>;

    async fn delete(&self, id: &ShopId) -> AppResult<()>;

    async fn find_page(&self, page: &Pagination<ShopSorting>) -> AppResult<PagedResult<Shop>>;
}

/// 仓库 Repository
///
/// 库存记录（ProductCount）按仓库维度管理，挂在这里。
#[async_trait]
pub trait WarehouseRepository: Send + Sync {
    async fn find_by_id(&self, id: &WarehouseId) -> AppResult<Option<Warehouse>>;

    async fn exists(&self, id: &WarehouseId) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn save(&self, warehouse: &Warehouse) -> AppResult<()>;

    async fn delete(&self, id: &WarehouseId) -> AppResult<()>;

    async fn find_page(
        &self,
        page: &Pagination<WarehouseSorting>,
    ) -> AppResult<PagedResult<Warehouse>>;

    async fn find_product_count(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
    ) -> AppResult<Option<ProductCount>>;

    async fn save_product_count(&self, count: &ProductCount) -> AppResult<()>;

    async fn find_product_count_page(
        &self,
        page: &Pagination<ProductCountSorting>,
    ) -> AppResult<PagedResult<ProductCount>>;
}

/// 地址 Repository
#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn find_by_id(&self, id: &AddressId) -> AppResult<Option<Address>>;

    async fn exists(&self, id: &AddressId) -> AppResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    async fn save(&self, address: &Address) -> AppResult<()>;

    async fn delete(&self, id: &AddressId) -> AppResult<()>;
}
