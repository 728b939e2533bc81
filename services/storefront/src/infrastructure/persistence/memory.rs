//! 基于内存的 Unit of Work 实现
//!
//! begin 时对共享存储做快照，工作副本上的修改在 commit 时整体写回，
//! rollback 或 Drop 则整体丢弃，与数据库事务的可见性语义一致。
//! 供服务层测试和本地开发使用。

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bookmart_common::{
    AddressId, AuthorId, AuthorSorting, BookId, BookSorting, CustomerId, CustomerSorting,
    Email, EmployeeId, EmployeeSorting, Login, OrderId, OrderSorting, PagedResult, Pagination,
    ProductCountId, ProductCountSorting, ProductId, ProductSorting, ShopId, ShopSorting, SortKey,
    WarehouseId, WarehouseSorting,
};
use bookmart_domain_core::{
    Address, Author, Book, Customer, Employee, Order, Product, ProductCount, Shop, Warehouse,
};
use bookmart_errors::{AppError, AppResult};
use bookmart_ports::{
    AddressRepository, AuthorRepository, BookRepository, CustomerRepository, EmployeeRepository,
    OrderRepository, ProductRepository, ShopRepository, UnitOfWork, UnitOfWorkFactory,
    WarehouseRepository,
};

#[derive(Debug, Default, Clone)]
struct Store {
    authors: HashMap<AuthorId, Author>,
    books: HashMap<BookId, Book>,
    customers: HashMap<CustomerId, Customer>,
    employees: HashMap<EmployeeId, Employee>,
    orders: HashMap<OrderId, Order>,
    products: HashMap<ProductId, Product>,
    shops: HashMap<ShopId, Shop>,
    warehouses: HashMap<WarehouseId, Warehouse>,
    product_counts: HashMap<ProductCountId, ProductCount>,
    addresses: HashMap<AddressId, Address>,
}

type SharedStore = Arc<Mutex<Store>>;

fn lock(store: &SharedStore) -> AppResult<MutexGuard<'_, Store>> {
    store
        .lock()
        .map_err(|_| AppError::internal("Store lock poisoned"))
}

fn paginate<T, S: SortKey>(
    mut items: Vec<T>,
    page: &Pagination<S>,
    cmp: impl FnMut(&T, &T) -> Ordering,
) -> PagedResult<T> {
    items.sort_by(cmp);
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.page_size() as usize)
        .collect();
    PagedResult::new(items, total, page)
}

/// 内存 Unit of Work 工厂
///
/// Clone 后共享同一份底层存储。
#[derive(Default, Clone)]
pub struct MemoryUnitOfWorkFactory {
    store: SharedStore,
}

impl MemoryUnitOfWorkFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UnitOfWorkFactory for MemoryUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let snapshot = lock(&self.store)?.clone();
        Ok(Box::new(MemoryUnitOfWork::new(
            Arc::clone(&self.store),
            snapshot,
        )))
    }
}

/// 内存 Unit of Work
///
/// 提交把 begin 时的整份快照连同本单元的写入写回底层存储，
/// 隔离级别相当于快照级：两个在时间上交错提交的单元以后提交者为准，
/// 先提交者的写入会丢失。测试中并发访问同一存储时须串行各单元。
pub struct MemoryUnitOfWork {
    base: SharedStore,
    working: SharedStore,
    authors: MemAuthorRepository,
    books: MemBookRepository,
    customers: MemCustomerRepository,
    employees: MemEmployeeRepository,
    orders: MemOrderRepository,
    products: MemProductRepository,
    shops: MemShopRepository,
    warehouses: MemWarehouseRepository,
    addresses: MemAddressRepository,
}

impl MemoryUnitOfWork {
    fn new(base: SharedStore, snapshot: Store) -> Self {
        let working: SharedStore = Arc::new(Mutex::new(snapshot));
        Self {
            authors: MemAuthorRepository {
                store: Arc::clone(&working),
            },
            books: MemBookRepository {
                store: Arc::clone(&working),
            },
            customers: MemCustomerRepository {
                store: Arc::clone(&working),
            },
            employees: MemEmployeeRepository {
                store: Arc::clone(&working),
            },
            orders: MemOrderRepository {
                store: Arc::clone(&working),
            },
            products: MemProductRepository {
                store: Arc::clone(&working),
            },
            shops: MemShopRepository {
                store: Arc::clone(&working),
            },
            warehouses: MemWarehouseRepository {
                store: Arc::clone(&working),
            },
            addresses: MemAddressRepository {
                store: Arc::clone(&working),
            },
            base,
            working,
        }
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn authors(&self) -> &dyn AuthorRepository {
        &self.authors
    }

    fn books(&self) -> &dyn BookRepository {
        &self.books
    }

    fn customers(&self) -> &dyn CustomerRepository {
        &self.customers
    }

    fn employees(&self) -> &dyn EmployeeRepository {
        &self.employees
    }

    fn orders(&self) -> &dyn OrderRepository {
        &self.orders
    }

    fn products(&self) -> &dyn ProductRepository {
        &self.products
    }

    fn shops(&self) -> &dyn ShopRepository {
        &self.shops
    }

    fn warehouses(&self) -> &dyn WarehouseRepository {
        &self.warehouses
    }

    fn addresses(&self) -> &dyn AddressRepository {
        &self.addresses
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let snapshot = lock(&self.working)?.clone();
        *lock(&self.base)? = snapshot;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        // 工作副本随 self 一起丢弃
        Ok(())
    }
}

macro_rules! define_mem_repo {
    ($name:ident) => {
        struct $name {
            store: SharedStore,
        }
    };
}

define_mem_repo!(MemAuthorRepository);
define_mem_repo!(MemBookRepository);
define_mem_repo!(MemCustomerRepository);
define_mem_repo!(MemEmployeeRepository);
define_mem_repo!(MemOrderRepository);
define_mem_repo!(MemProductRepository);
define_mem_repo!(MemShopRepository);
define_mem_repo!(MemWarehouseRepository);
define_mem_repo!(MemAddressRepository);

#[async_trait]
impl AuthorRepository for MemAuthorRepository {
    async fn find_by_id(&self, id: &AuthorId) -> AppResult<Option<Author>> {
        Ok(lock(&self.store)?.authors.get(id).cloned())
    }

    async fn find_by_name(&self, first_name: &str, last_name: &str) -> AppResult<Option<Author>> {
        Ok(lock(&self.store)?
            .authors
            .values()
            .find(|a| a.first_name == first_name && a.last_name == last_name)
            .cloned())
    }

    async fn save(&self, author: &Author) -> AppResult<()> {
        lock(&self.store)?.authors.insert(author.id, author.clone());
        Ok(())
    }

    async fn delete(&self, id: &AuthorId) -> AppResult<()> {
        lock(&self.store)?
            .authors
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Author {} not found", id)))
    }

    async fn find_page(&self, page: &Pagination<AuthorSorting>) -> AppResult<PagedResult<Author>> {
        let items: Vec<Author> = lock(&self.store)?.authors.values().cloned().collect();
        Ok(paginate(items, page, |a, b| match page.sort() {
            AuthorSorting::FirstName => a.first_name.cmp(&b.first_name),
            AuthorSorting::LastName => a.last_name.cmp(&b.last_name),
        }))
    }
}

#[async_trait]
impl BookRepository for MemBookRepository {
    async fn find_by_id(&self, id: &BookId) -> AppResult<Option<Book>> {
        Ok(lock(&self.store)?.books.get(id).cloned())
    }

    async fn save(&self, book: &Book) -> AppResult<()> {
        lock(&self.store)?.books.insert(book.id, book.clone());
        Ok(())
    }

    async fn delete(&self, id: &BookId) -> AppResult<()> {
        lock(&self.store)?
            .books
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Book {} not found", id)))
    }

    async fn find_page(&self, page: &Pagination<BookSorting>) -> AppResult<PagedResult<Book>> {
        let store = lock(&self.store)?;
        let items: Vec<Book> = store.books.values().cloned().collect();
        // 作者全名排序需要跨聚合查找
        let full_names: HashMap<AuthorId, String> = store
            .authors
            .iter()
            .map(|(id, a)| (*id, a.full_name()))
            .collect();
        drop(store);

        Ok(paginate(items, page, |a, b| match page.sort() {
            BookSorting::Title => a.title.cmp(&b.title),
            BookSorting::Price => a.price.amount.cmp(&b.price.amount),
            BookSorting::AuthorFullName => {
                let empty = String::new();
                let left = full_names.get(&a.author_id).unwrap_or(&empty);
                let right = full_names.get(&b.author_id).unwrap_or(&empty);
                left.cmp(right)
            }
        }))
    }
}

#[async_trait]
impl CustomerRepository for MemCustomerRepository {
    async fn find_by_id(&self, id: &CustomerId) -> AppResult<Option<Customer>> {
        Ok(lock(&self.store)?.customers.get(id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AppResult<Option<Customer>> {
        Ok(lock(&self.store)?
            .customers
            .values()
            .find(|c| c.email == *email)
            .cloned())
    }

    async fn save(&self, customer: &Customer) -> AppResult<()> {
        lock(&self.store)?
            .customers
            .insert(customer.id, customer.clone());
        Ok(())
    }

    async fn delete(&self, id: &CustomerId) -> AppResult<()> {
        lock(&self.store)?
            .customers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Customer {} not found", id)))
    }

    async fn find_page(
        &self,
        page: &Pagination<CustomerSorting>,
    ) -> AppResult<PagedResult<Customer>> {
        let items: Vec<Customer> = lock(&self.store)?.customers.values().cloned().collect();
        Ok(paginate(items, page, |a, b| match page.sort() {
            CustomerSorting::Email => a.email.as_str().cmp(b.email.as_str()),
        }))
    }
}

#[async_trait]
impl EmployeeRepository for MemEmployeeRepository {
    async fn find_by_id(&self, id: &EmployeeId) -> AppResult<Option<Employee>> {
        Ok(lock(&self.store)?.employees.get(id).cloned())
    }

    async fn find_by_login(&self, login: &Login) -> AppResult<Option<Employee>> {
        Ok(lock(&self.store)?
            .employees
            .values()
            .find(|e| e.login == *login)
            .cloned())
    }

    async fn save(&self, employee: &Employee) -> AppResult<()> {
        lock(&self.store)?
            .employees
            .insert(employee.id, employee.clone());
        Ok(())
    }

    async fn delete(&self, id: &EmployeeId) -> AppResult<()> {
        lock(&self.store)?
            .employees
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Employee {} not found", id)))
    }

    async fn find_page(
        &self,
        page: &Pagination<EmployeeSorting>,
    ) -> AppResult<PagedResult<Employee>> {
        let items: Vec<Employee> = lock(&self.store)?.employees.values().cloned().collect();
        Ok(paginate(items, page, |a, b| match page.sort() {
            EmployeeSorting::Login => a.login.as_str().cmp(b.login.as_str()),
            EmployeeSorting::Name => a.name.cmp(&b.name),
        }))
    }
}

#[async_trait]
impl OrderRepository for MemOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> AppResult<Option<Order>> {
        Ok(lock(&self.store)?.orders.get(id).cloned())
    }

    async fn save(&self, order: &Order) -> AppResult<()> {
        lock(&self.store)?.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn delete(&self, id: &OrderId) -> AppResult<()> {
        lock(&self.store)?
            .orders
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))
    }

    async fn find_page(&self, page: &Pagination<OrderSorting>) -> AppResult<PagedResult<Order>> {
        let items: Vec<Order> = lock(&self.store)?.orders.values().cloned().collect();
        Ok(paginate(items, page, |a, b| match page.sort() {
            OrderSorting::CreatedAt => a.audit.created_at.cmp(&b.audit.created_at),
            OrderSorting::Total => a.total.amount.cmp(&b.total.amount),
        }))
    }
}

#[async_trait]
impl ProductRepository for MemProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> AppResult<Option<Product>> {
        Ok(lock(&self.store)?.products.get(id).cloned())
    }

    async fn save(&self, product: &Product) -> AppResult<()> {
        lock(&self.store)?
            .products
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> AppResult<()> {
        lock(&self.store)?
            .products
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))
    }

    async fn find_page(
        &self,
        page: &Pagination<ProductSorting>,
    ) -> AppResult<PagedResult<Product>> {
        let items: Vec<Product> = lock(&self.store)?.products.values().cloned().collect();
        Ok(paginate(items, page, |a, b| match page.sort() {
            ProductSorting::Name => a.name.cmp(&b.name),
            ProductSorting::Price => a.price.amount.cmp(&b.price.amount),
        }))
    }
}

#[async_trait]
impl ShopRepository for MemShopRepository {
    async fn find_by_id(&self, id: &ShopId) -> AppResult<Option<Shop>> {
        Ok(lock(&self.store)?.shops.get(id).cloned())
    }

    async fn save(&self, shop: &Shop) -> AppResult<()> {
        lock(&self.store)?.shops.insert(shop.id, shop.clone());
        Ok(())
    }

    async fn delete(&self, id: &ShopId) -> AppResult<()> {
        lock(&self.store)?
            .shops
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Shop {} not found", id)))
    }

    async fn find_page(&self, page: &Pagination<ShopSorting>) -> AppResult<PagedResult<Shop>> {
        let items: Vec<Shop> = lock(&self.store)?.shops.values().cloned().collect();
        Ok(paginate(items, page, |a, b| match page.sort() {
            ShopSorting::Name => a.name.cmp(&b.name),
        }))
    }
}

#[async_trait]
impl WarehouseRepository for MemWarehouseRepository {
    async fn find_by_id(&self, id: &WarehouseId) -> AppResult<Option<Warehouse>> {
        Ok(lock(&self.store)?.warehouses.get(id).cloned())
    }

    async fn save(&self, warehouse: &Warehouse) -> AppResult<()> {
        lock(&self.store)?
            .warehouses
            .insert(warehouse.id, warehouse.clone());
        Ok(())
    }

    async fn delete(&self, id: &WarehouseId) -> AppResult<()> {
        lock(&self.store)?
            .warehouses
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Warehouse {} not found", id)))
    }

    async fn find_page(
        &self,
        page: &Pagination<WarehouseSorting>,
    ) -> AppResult<PagedResult<Warehouse>> {
        let items: Vec<Warehouse> = lock(&self.store)?.warehouses.values().cloned().collect();
        Ok(paginate(items, page, |a, b| match page.sort() {
            WarehouseSorting::Name => a.name.cmp(&b.name),
        }))
    }

    async fn find_product_count(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
    ) -> AppResult<Option<ProductCount>> {
        Ok(lock(&self.store)?
            .product_counts
            .values()
            .find(|c| c.warehouse_id == *warehouse_id && c.product_id == *product_id)
            .cloned())
    }

    async fn save_product_count(&self, count: &ProductCount) -> AppResult<()> {
        let mut store = lock(&self.store)?;
        // (warehouse, product) 对唯一，覆盖已有记录
        let existing = store
            .product_counts
            .values()
            .find(|c| c.warehouse_id == count.warehouse_id && c.product_id == count.product_id)
            .map(|c| c.id);
        if let Some(id) = existing {
            store.product_counts.remove(&id);
        }
        store.product_counts.insert(count.id, count.clone());
        Ok(())
    }

    async fn find_product_count_page(
        &self,
        page: &Pagination<ProductCountSorting>,
    ) -> AppResult<PagedResult<ProductCount>> {
        let items: Vec<ProductCount> =
            lock(&self.store)?.product_counts.values().cloned().collect();
        Ok(paginate(items, page, |a, b| match page.sort() {
            ProductCountSorting::Count => a.count.cmp(&b.count),
        }))
    }
}

#[async_trait]
impl AddressRepository for MemAddressRepository {
    async fn find_by_id(&self, id: &AddressId) -> AppResult<Option<Address>> {
        Ok(lock(&self.store)?.addresses.get(id).cloned())
    }

    async fn save(&self, address: &Address) -> AppResult<()> {
        lock(&self.store)?
            .addresses
            .insert(address.id, address.clone());
        Ok(())
    }

    async fn delete(&self, id: &AddressId) -> AppResult<()> {
        lock(&self.store)?
            .addresses
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found(format!("Address {} not found", id)))
    }
}
