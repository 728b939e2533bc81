//! 事务感知的 Repository 实现
//!
//! 这些 Repository 使用共享的 Transaction 而非 PgPool，
//! 同一 Unit of Work 内的所有操作落在同一个事务上。

use async_trait::async_trait;
use bookmart_common::{
    AddressId, AuditInfo, AuthorId, AuthorSorting, BookId, BookSorting, CustomerId,
    CustomerSorting, Email, EmployeeId, EmployeeRole, EmployeeSorting, Login, OrderId,
    OrderSorting, PagedResult, Pagination, ProductCountId, ProductCountSorting, ProductId,
    ProductSorting, ShopId, ShopSorting, SortKey, WarehouseId, WarehouseSorting,
};
use bookmart_domain_core::{
    Address, Author, Book, Currency, Customer, Employee, Money, Order, OrderStatus, PasswordHash,
    Product, ProductCount, Shop, Warehouse,
};
use bookmart_errors::{AppError, AppResult};
use bookmart_ports::{
    AddressRepository, AuthorRepository, BookRepository, CustomerRepository, EmployeeRepository,
    OrderRepository, ProductRepository, ShopRepository, WarehouseRepository,
};
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

/// 共享事务类型
pub(crate) type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// 宏：定义一个简单的 TxRepository 结构体
macro_rules! define_tx_repo {
    ($name:ident) => {
        pub struct $name {
            tx: SharedTx,
        }

        impl $name {
            pub(crate) fn new(tx: SharedTx) -> Self {
                Self { tx }
            }
        }
    };
}

define_tx_repo!(TxAuthorRepository);
define_tx_repo!(TxBookRepository);
define_tx_repo!(TxCustomerRepository);
define_tx_repo!(TxEmployeeRepository);
define_tx_repo!(TxOrderRepository);
define_tx_repo!(TxProductRepository);
define_tx_repo!(TxShopRepository);
define_tx_repo!(TxWarehouseRepository);
define_tx_repo!(TxAddressRepository);

fn db_err(context: &str, e: sqlx::Error) -> AppError {
    AppError::database(format!("{}: {}", context, e))
}

/// OFFSET 绑定参数。偏移量超出 i64 时饱和到 i64::MAX，
/// 这样的页必然落在任何表的末尾之后，返回空页而不是报错。
fn sql_offset<S: SortKey>(page: &Pagination<S>) -> i64 {
    i64::try_from(page.offset()).unwrap_or(i64::MAX)
}

fn consumed() -> AppError {
    AppError::internal("Transaction already consumed")
}

fn role_to_str(role: EmployeeRole) -> &'static str {
    match role {
        EmployeeRole::Manager => "manager",
        EmployeeRole::Cashier => "cashier",
    }
}

fn role_from_str(s: &str) -> AppResult<EmployeeRole> {
    match s {
        "manager" => Ok(EmployeeRole::Manager),
        "cashier" => Ok(EmployeeRole::Cashier),
        other => Err(AppError::database(format!("Unknown employee role: {}", other))),
    }
}

fn status_to_str(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Placed => "placed",
        OrderStatus::Paid => "paid",
        OrderStatus::Shipped => "shipped",
        OrderStatus::Completed => "completed",
        OrderStatus::Cancelled => "cancelled",
    }
}

fn status_from_str(s: &str) -> AppResult<OrderStatus> {
    match s {
        "placed" => Ok(OrderStatus::Placed),
        "paid" => Ok(OrderStatus::Paid),
        "shipped" => Ok(OrderStatus::Shipped),
        "completed" => Ok(OrderStatus::Completed),
        "cancelled" => Ok(OrderStatus::Cancelled),
        other => Err(AppError::database(format!("Unknown order status: {}", other))),
    }
}

fn audit(created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> AuditInfo {
    AuditInfo {
        created_at,
        updated_at,
    }
}

// =============================================================================
// 行类型
// =============================================================================

#[derive(sqlx::FromRow)]
struct AuthorRow {
    id: uuid::Uuid,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AuthorRow {
    fn into_author(self) -> Author {
        Author {
            id: AuthorId::from_uuid(self.id),
            first_name: self.first_name,
            last_name: self.last_name,
            audit: audit(self.created_at, self.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookRow {
    id: uuid::Uuid,
    title: String,
    author_id: uuid::Uuid,
    price_cents: i64,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookRow {
    fn into_book(self) -> Book {
        Book {
            id: BookId::from_uuid(self.id),
            title: self.title,
            author_id: AuthorId::from_uuid(self.author_id),
            price: Money::new(self.price_cents, Currency::new(&self.currency)),
            audit: audit(self.created_at, self.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: uuid::Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_customer(self) -> AppResult<Customer> {
        Ok(Customer {
            id: CustomerId::from_uuid(self.id),
            email: Email::new(self.email)?,
            password_hash: PasswordHash::from_stored(self.password_hash),
            audit: audit(self.created_at, self.updated_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: uuid::Uuid,
    login: String,
    name: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EmployeeRow {
    fn into_employee(self) -> AppResult<Employee> {
        Ok(Employee {
            id: EmployeeId::from_uuid(self.id),
            login: Login::new(self.login)?,
            name: self.name,
            role: role_from_str(&self.role)?,
            password_hash: PasswordHash::from_stored(self.password_hash),
            audit: audit(self.created_at, self.updated_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: uuid::Uuid,
    customer_id: uuid::Uuid,
    shop_id: uuid::Uuid,
    status: String,
    total_cents: i64,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> AppResult<Order> {
        Ok(Order {
            id: OrderId::from_uuid(self.id),
            customer_id: CustomerId::from_uuid(self.customer_id),
            shop_id: ShopId::from_uuid(self.shop_id),
            status: status_from_str(&self.status)?,
            total: Money::new(self.total_cents, Currency::new(&self.currency)),
            audit: audit(self.created_at, self.updated_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: uuid::Uuid,
    name: String,
    price_cents: i64,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> Product {
        Product {
            id: ProductId::from_uuid(self.id),
            name: self.name,
            price: Money::new(self.price_cents, Currency::new(&self.currency)),
            audit: audit(self.created_at, self.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductCountRow {
    id: uuid::Uuid,
    product_id: uuid::Uuid,
    warehouse_id: uuid::Uuid,
    count: i64,
}

impl ProductCountRow {
    fn into_product_count(self) -> ProductCount {
        ProductCount {
            id: ProductCountId::from_uuid(self.id),
            product_id: ProductId::from_uuid(self.product_id),
            warehouse_id: WarehouseId::from_uuid(self.warehouse_id),
            count: self.count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ShopRow {
    id: uuid::Uuid,
    name: String,
    address_id: uuid::Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ShopRow {
    fn into_shop(self) -> Shop {
        Shop {
            id: ShopId::from_uuid(self.id),
            name: self.name,
            address_id: AddressId::from_uuid(self.address_id),
            audit: audit(self.created_at, self.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct WarehouseRow {
    id: uuid::Uuid,
    name: String,
    address_id: uuid::Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WarehouseRow {
    fn into_warehouse(self) -> Warehouse {
        Warehouse {
            id: WarehouseId::from_uuid(self.id),
            name: self.name,
            address_id: AddressId::from_uuid(self.address_id),
            audit: audit(self.created_at, self.updated_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: uuid::Uuid,
    city: String,
    street: String,
    building: String,
}

impl AddressRow {
    fn into_address(self) -> Address {
        Address {
            id: AddressId::from_uuid(self.id),
            city: self.city,
            street: self.street,
            building: self.building,
        }
    }
}

// =============================================================================
// AuthorRepository 实现
// =============================================================================

#[async_trait]
impl AuthorRepository for TxAuthorRepository {
    async fn find_by_id(&self, id: &AuthorId) -> AppResult<Option<Author>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, AuthorRow>("SELECT * FROM authors WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to find author", e))?;

        Ok(row.map(AuthorRow::into_author))
    }

    async fn find_by_name(&self, first_name: &str, last_name: &str) -> AppResult<Option<Author>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, AuthorRow>(
            "SELECT * FROM authors WHERE first_name = $1 AND last_name = $2",
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to find author by name", e))?;

        Ok(row.map(AuthorRow::into_author))
    }

    async fn save(&self, author: &Author) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query(
            r#"
            INSERT INTO authors (id, first_name, last_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET first_name = $2, last_name = $3, updated_at = $5
            "#,
        )
        .bind(author.id.0)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.audit.created_at)
        .bind(author.audit.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to save author", e))?;

        Ok(())
    }

    async fn delete(&self, id: &AuthorId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to delete author", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Author {} not found", id)));
        }
        Ok(())
    }

    async fn find_page(&self, page: &Pagination<AuthorSorting>) -> AppResult<PagedResult<Author>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to count authors", e))?;

        let rows = sqlx::query_as::<_, AuthorRow>(&format!(
            "SELECT * FROM authors ORDER BY {} LIMIT $1 OFFSET $2",
            page.sort().order_by()
        ))
        .bind(i64::from(page.page_size()))
        .bind(sql_offset(page))
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to list authors", e))?;

        Ok(PagedResult::new(
            rows.into_iter().map(AuthorRow::into_author).collect(),
            total as u64,
            page,
        ))
    }
}

// =============================================================================
// BookRepository 实现
// =============================================================================

#[async_trait]
impl BookRepository for TxBookRepository {
    async fn find_by_id(&self, id: &BookId) -> AppResult<Option<Book>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, BookRow>("SELECT * FROM books WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to find book", e))?;

        Ok(row.map(BookRow::into_book))
    }

    async fn save(&self, book: &Book) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query(
            r#"
            INSERT INTO books (id, title, author_id, price_cents, currency, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET title = $2, author_id = $3, price_cents = $4, currency = $5, updated_at = $7
            "#,
        )
        .bind(book.id.0)
        .bind(&book.title)
        .bind(book.author_id.0)
        .bind(book.price.amount)
        .bind(book.price.currency.as_str())
        .bind(book.audit.created_at)
        .bind(book.audit.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to save book", e))?;

        Ok(())
    }

    async fn delete(&self, id: &BookId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to delete book", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Book {} not found", id)));
        }
        Ok(())
    }

    async fn find_page(&self, page: &Pagination<BookSorting>) -> AppResult<PagedResult<Book>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to count books", e))?;

        // 按作者全名排序需要关联 authors 表
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            SELECT books.* FROM books
            JOIN authors ON authors.id = books.author_id
            ORDER BY {} LIMIT $1 OFFSET $2
            "#,
            page.sort().order_by()
        ))
        .bind(i64::from(page.page_size()))
        .bind(sql_offset(page))
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to list books", e))?;

        Ok(PagedResult::new(
            rows.into_iter().map(BookRow::into_book).collect(),
            total as u64,
            page,
        ))
    }
}

// =============================================================================
// CustomerRepository 实现
// =============================================================================

#[async_trait]
impl CustomerRepository for TxCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> AppResult<Option<Customer>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, CustomerRow>("SELECT * FROM customers WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to find customer", e))?;

        row.map(CustomerRow::into_customer).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<Option<Customer>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, CustomerRow>("SELECT * FROM customers WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to find customer by email", e))?;

        row.map(CustomerRow::into_customer).transpose()
    }

    async fn save(&self, customer: &Customer) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query(
            r#"
            INSERT INTO customers (id, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET email = $2, password_hash = $3, updated_at = $5
            "#,
        )
        .bind(customer.id.0)
        .bind(customer.email.as_str())
        .bind(customer.password_hash.as_str())
        .bind(customer.audit.created_at)
        .bind(customer.audit.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to save customer", e))?;

        Ok(())
    }

    async fn delete(&self, id: &CustomerId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to delete customer", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Customer {} not found", id)));
        }
        Ok(())
    }

    async fn find_page(
        &self,
        page: &Pagination<CustomerSorting>,
    ) -> AppResult<PagedResult<Customer>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to count customers", e))?;

        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT * FROM customers ORDER BY {} LIMIT $1 OFFSET $2",
            page.sort().order_by()
        ))
        .bind(i64::from(page.page_size()))
        .bind(sql_offset(page))
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to list customers", e))?;

        let items = rows
            .into_iter()
            .map(CustomerRow::into_customer)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(PagedResult::new(items, total as u64, page))
    }
}

// =============================================================================
// EmployeeRepository 实现
// =============================================================================

#[async_trait]
impl EmployeeRepository for TxEmployeeRepository {
    async fn find_by_id(&self, id: &EmployeeId) -> AppResult<Option<Employee>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, EmployeeRow>("SELECT * FROM employees WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to find employee", e))?;

        row.map(EmployeeRow::into_employee).transpose()
    }

    async fn find_by_login(&self, login: &Login) -> AppResult<Option<Employee>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, EmployeeRow>("SELECT * FROM employees WHERE login = $1")
            .bind(login.as_str())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to find employee by login", e))?;

        row.map(EmployeeRow::into_employee).transpose()
    }

    async fn save(&self, employee: &Employee) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query(
            r#"
            INSERT INTO employees (id, login, name, role, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE
            SET login = $2, name = $3, role = $4, password_hash = $5, updated_at = $7
            "#,
        )
        .bind(employee.id.0)
        .bind(employee.login.as_str())
        .bind(&employee.name)
        .bind(role_to_str(employee.role))
        .bind(employee.password_hash.as_str())
        .bind(employee.audit.created_at)
        .bind(employee.audit.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to save employee", e))?;

        Ok(())
    }

    async fn delete(&self, id: &EmployeeId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to delete employee", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Employee {} not found", id)));
        }
        Ok(())
    }

    async fn find_page(
        &self,
        page: &Pagination<EmployeeSorting>,
    ) -> AppResult<PagedResult<Employee>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to count employees", e))?;

        let rows = sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT * FROM employees ORDER BY {} LIMIT $1 OFFSET $2",
            page.sort().order_by()
        ))
        .bind(i64::from(page.page_size()))
        .bind(sql_offset(page))
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to list employees", e))?;

        let items = rows
            .into_iter()
            .map(EmployeeRow::into_employee)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(PagedResult::new(items, total as u64, page))
    }
}

// =============================================================================
// OrderRepository 实现
// =============================================================================

#[async_trait]
impl OrderRepository for TxOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> AppResult<Option<Order>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to find order", e))?;

        row.map(OrderRow::into_order).transpose()
    }

    async fn save(&self, order: &Order) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query(
            r#"
            INSERT INTO orders
                (id, customer_id, shop_id, status, total_cents, currency, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE
            SET status = $4, total_cents = $5, currency = $6, updated_at = $8
            "#,
        )
        .bind(order.id.0)
        .bind(order.customer_id.0)
        .bind(order.shop_id.0)
        .bind(status_to_str(order.status))
        .bind(order.total.amount)
        .bind(order.total.currency.as_str())
        .bind(order.audit.created_at)
        .bind(order.audit.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to save order", e))?;

        Ok(())
    }

    async fn delete(&self, id: &OrderId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to delete order", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Order {} not found", id)));
        }
        Ok(())
    }

    async fn find_page(&self, page: &Pagination<OrderSorting>) -> AppResult<PagedResult<Order>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to count orders", e))?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT * FROM orders ORDER BY {} LIMIT $1 OFFSET $2",
            page.sort().order_by()
        ))
        .bind(i64::from(page.page_size()))
        .bind(sql_offset(page))
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to list orders", e))?;

        let items = rows
            .into_iter()
            .map(OrderRow::into_order)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(PagedResult::new(items, total as u64, page))
    }
}

// =============================================================================
// ProductRepository 实现
// =============================================================================

#[async_trait]
impl ProductRepository for TxProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> AppResult<Option<Product>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to find product", e))?;

        Ok(row.map(ProductRow::into_product))
    }

    async fn save(&self, product: &Product) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, currency, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET name = $2, price_cents = $3, currency = $4, updated_at = $6
            "#,
        )
        .bind(product.id.0)
        .bind(&product.name)
        .bind(product.price.amount)
        .bind(product.price.currency.as_str())
        .bind(product.audit.created_at)
        .bind(product.audit.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to save product", e))?;

        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to delete product", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Product {} not found", id)));
        }
        Ok(())
    }

    async fn find_page(
        &self,
        page: &Pagination<ProductSorting>,
    ) -> AppResult<PagedResult<Product>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to count products", e))?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT * FROM products ORDER BY {} LIMIT $1 OFFSET $2",
            page.sort().order_by()
        ))
        .bind(i64::from(page.page_size()))
        .bind(sql_offset(page))
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to list products", e))?;

        Ok(PagedResult::new(
            rows.into_iter().map(ProductRow::into_product).collect(),
            total as u64,
            page,
        ))
    }
}

// =============================================================================
// ShopRepository 实现
// =============================================================================

#[async_trait]
impl ShopRepository for TxShopRepository {
    async fn find_by_id(&self, id: &ShopId) -> AppResult<Option<Shop>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, ShopRow>("SELECT * FROM shops WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to find shop", e))?;

        Ok(row.map(ShopRow::into_shop))
    }

    async fn save(&self, shop: &Shop) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query(
            r#"
            INSERT INTO shops (id, name, address_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = $2, address_id = $3, updated_at = $5
            "#,
        )
        .bind(shop.id.0)
        .bind(&shop.name)
        .bind(shop.address_id.0)
        .bind(shop.audit.created_at)
        .bind(shop.audit.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to save shop", e))?;

        Ok(())
    }

    async fn delete(&self, id: &ShopId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query("DELETE FROM shops WHERE id = $1")
            .bind(id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to delete shop", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Shop {} not found", id)));
        }
        Ok(())
    }

    async fn find_page(&self, page: &Pagination<ShopSorting>) -> AppResult<PagedResult<Shop>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shops")
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to count shops", e))?;

        let rows = sqlx::query_as::<_, ShopRow>(&format!(
            "SELECT * FROM shops ORDER BY {} LIMIT $1 OFFSET $2",
            page.sort().order_by()
        ))
        .bind(i64::from(page.page_size()))
        .bind(sql_offset(page))
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to list shops", e))?;

        Ok(PagedResult::new(
            rows.into_iter().map(ShopRow::into_shop).collect(),
            total as u64,
            page,
        ))
    }
}

// =============================================================================
// WarehouseRepository 实现
// =============================================================================

#[async_trait]
impl WarehouseRepository for TxWarehouseRepository {
    async fn find_by_id(&self, id: &WarehouseId) -> AppResult<Option<Warehouse>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, WarehouseRow>("SELECT * FROM warehouses WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to find warehouse", e))?;

        Ok(row.map(WarehouseRow::into_warehouse))
    }

    async fn save(&self, warehouse: &Warehouse) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query(
            r#"
            INSERT INTO warehouses (id, name, address_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET name = $2, address_id = $3, updated_at = $5
            "#,
        )
        .bind(warehouse.id.0)
        .bind(&warehouse.name)
        .bind(warehouse.address_id.0)
        .bind(warehouse.audit.created_at)
        .bind(warehouse.audit.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to save warehouse", e))?;

        Ok(())
    }

    async fn delete(&self, id: &WarehouseId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query("DELETE FROM warehouses WHERE id = $1")
            .bind(id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to delete warehouse", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Warehouse {} not found", id)));
        }
        Ok(())
    }

    async fn find_page(
        &self,
        page: &Pagination<WarehouseSorting>,
    ) -> AppResult<PagedResult<Warehouse>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM warehouses")
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to count warehouses", e))?;

        let rows = sqlx::query_as::<_, WarehouseRow>(&format!(
            "SELECT * FROM warehouses ORDER BY {} LIMIT $1 OFFSET $2",
            page.sort().order_by()
        ))
        .bind(i64::from(page.page_size()))
        .bind(sql_offset(page))
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to list warehouses", e))?;

        Ok(PagedResult::new(
            rows.into_iter().map(WarehouseRow::into_warehouse).collect(),
            total as u64,
            page,
        ))
    }

    async fn find_product_count(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
    ) -> AppResult<Option<ProductCount>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, ProductCountRow>(
            "SELECT * FROM product_counts WHERE warehouse_id = $1 AND product_id = $2",
        )
        .bind(warehouse_id.0)
        .bind(product_id.0)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to find product count", e))?;

        Ok(row.map(ProductCountRow::into_product_count))
    }

    async fn save_product_count(&self, count: &ProductCount) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query(
            r#"
            INSERT INTO product_counts (id, product_id, warehouse_id, count)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (warehouse_id, product_id) DO UPDATE
            SET count = $4
            "#,
        )
        .bind(count.id.0)
        .bind(count.product_id.0)
        .bind(count.warehouse_id.0)
        .bind(count.count)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to save product count", e))?;

        Ok(())
    }

    async fn find_product_count_page(
        &self,
        page: &Pagination<ProductCountSorting>,
    ) -> AppResult<PagedResult<ProductCount>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_counts")
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to count product counts", e))?;

        let rows = sqlx::query_as::<_, ProductCountRow>(&format!(
            "SELECT * FROM product_counts ORDER BY {} LIMIT $1 OFFSET $2",
            page.sort().order_by()
        ))
        .bind(i64::from(page.page_size()))
        .bind(sql_offset(page))
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to list product counts", e))?;

        Ok(PagedResult::new(
            rows.into_iter()
                .map(ProductCountRow::into_product_count)
                .collect(),
            total as u64,
            page,
        ))
    }
}

// =============================================================================
// AddressRepository 实现
// =============================================================================

#[async_trait]
impl AddressRepository for TxAddressRepository {
    async fn find_by_id(&self, id: &AddressId) -> AppResult<Option<Address>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let row = sqlx::query_as::<_, AddressRow>("SELECT * FROM addresses WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to find address", e))?;

        Ok(row.map(AddressRow::into_address))
    }

    async fn save(&self, address: &Address) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        sqlx::query(
            r#"
            INSERT INTO addresses (id, city, street, building)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET city = $2, street = $3, building = $4
            "#,
        )
        .bind(address.id.0)
        .bind(&address.city)
        .bind(&address.street)
        .bind(&address.building)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_err("Failed to save address", e))?;

        Ok(())
    }

    async fn delete(&self, id: &AddressId) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        let result = sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| db_err("Failed to delete address", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Address {} not found", id)));
        }
        Ok(())
    }
}
