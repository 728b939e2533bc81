//! PostgreSQL 适配器
//!
//! 提供连接池管理与基于事务的 Unit of Work 实现。

pub mod connection;
pub mod tx_repositories;
pub mod unit_of_work;

pub use connection::{PostgresConfig, check_connection, create_pool};
pub use unit_of_work::{PostgresUnitOfWork, PostgresUnitOfWorkFactory};
