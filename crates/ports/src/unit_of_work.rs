//! Unit of Work 模式
//!
//! 提供跨多个 Repository 的事务协调能力，确保一次入站操作的原子性。
//! 实例的生命周期限定在单个请求内，请求之间互不共享。

use async_trait::async_trait;
use bookmart_errors::AppResult;

use crate::repository::{
    AddressRepository, AuthorRepository, BookRepository, CustomerRepository, EmployeeRepository,
    OrderRepository, ProductRepository, ShopRepository, WarehouseRepository,
};

/// Unit of Work trait
///
/// 协调多个 Repository 在同一事务中的操作。`commit` / `rollback`
/// 按值消耗实例，所以一个实例至多提交一次；不提交直接丢弃时，
/// 暂存的全部变更一并作废。
///
/// # 使用示例
///
/// ```ignore
/// let uow = uow_factory.begin().await?;
///
/// // 所有操作在同一事务中
/// uow.books().save(&book).await?;
/// uow.authors().save(&author).await?;
///
/// // 提交事务
/// uow.commit().await?;
/// ```
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn authors(&self) -> &dyn AuthorRepository;

    fn books(&self) -> &dyn BookRepository;

    fn customers(&self) -> &dyn CustomerRepository;

    fn employees(&self) -> &dyn EmployeeRepository;

    fn orders(&self) -> &dyn OrderRepository;

    fn products(&self) -> &dyn ProductRepository;

    fn shops(&self) -> &dyn ShopRepository;

    fn warehouses(&self) -> &dyn WarehouseRepository;

    fn addresses(&self) -> &dyn AddressRepository;

    /// 提交事务
    ///
    /// 成功时所有暂存更改一并持久化，失败时自动回滚。
    /// 提交失败归为持久化错误，是唯一可合理重试的类别。
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务，撤销所有未提交的更改
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂 trait
///
/// 每个入站操作通过它获得自己的实例。
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始新的事务
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}
