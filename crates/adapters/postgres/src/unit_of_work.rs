//! PostgreSQL Unit of Work 实现
//!
//! 一个 Unit of Work 对应一个数据库事务，
//! 内部所有 Repository 共享同一个 Transaction。

use async_trait::async_trait;
use bookmart_errors::{AppError, AppResult};
use bookmart_ports::{
    AddressRepository, AuthorRepository, BookRepository, CustomerRepository, EmployeeRepository,
    OrderRepository, ProductRepository, ShopRepository, UnitOfWork, UnitOfWorkFactory,
    WarehouseRepository,
};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::tx_repositories::{
    SharedTx, TxAddressRepository, TxAuthorRepository, TxBookRepository, TxCustomerRepository,
    TxEmployeeRepository, TxOrderRepository, TxProductRepository, TxShopRepository,
    TxWarehouseRepository,
};

/// PostgreSQL Unit of Work 工厂
pub struct PostgresUnitOfWorkFactory {
    pool: PgPool,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;
        Ok(Box::new(PostgresUnitOfWork::new(tx)))
    }
}

/// PostgreSQL Unit of Work
///
/// commit / rollback 会消耗掉内部事务；
/// 既不提交也不回滚时，Drop 时由 sqlx 自动回滚。
pub struct PostgresUnitOfWork {
    tx: SharedTx,
    authors: TxAuthorRepository,
    books: TxBookRepository,
    customers: TxCustomerRepository,
    employees: TxEmployeeRepository,
    orders: TxOrderRepository,
    products: TxProductRepository,
    shops: TxShopRepository,
    warehouses: TxWarehouseRepository,
    addresses: TxAddressRepository,
}

impl PostgresUnitOfWork {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        let tx: SharedTx = Arc::new(Mutex::new(Some(tx)));
        Self {
            authors: TxAuthorRepository::new(Arc::clone(&tx)),
            books: TxBookRepository::new(Arc::clone(&tx)),
            customers: TxCustomerRepository::new(Arc::clone(&tx)),
            employees: TxEmployeeRepository::new(Arc::clone(&tx)),
            orders: TxOrderRepository::new(Arc::clone(&tx)),
            products: TxProductRepository::new(Arc::clone(&tx)),
            shops: TxShopRepository::new(Arc::clone(&tx)),
            warehouses: TxWarehouseRepository::new(Arc::clone(&tx)),
            addresses: TxAddressRepository::new(Arc::clone(&tx)),
            tx,
        }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
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
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;
        tx.rollback()
            .await
            .map_err(|e| AppError::database(format!("Failed to rollback transaction: {}", e)))
    }
}
