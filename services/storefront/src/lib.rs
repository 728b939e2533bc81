//! storefront - 零售书城应用层
//!
//! 把领域模型、端口和授权管线组装为可执行的业务操作：
//! 注册登录、作者与图书目录维护、订单查询与状态流转。

pub mod application;
pub mod error;
pub mod infrastructure;

pub use application::commands::auth::{
    AuthService, LoginCustomerCommand, LoginEmployeeCommand, RegisterCustomerCommand,
};
pub use application::commands::catalog::{
    AddBookCommand, CatalogService, DeleteBookCommand, UpdateBookCommand, UpsertAuthorCommand,
};
pub use application::commands::orders::{OrderService, UpdateOrderStatusCommand};
pub use application::dto::{BookDto, OrderDto};
pub use application::queries::catalog::{GetBookQuery, ListBooksQuery};
pub use application::queries::orders::{GetOrderQuery, ListOrdersQuery};
pub use infrastructure::persistence::memory::MemoryUnitOfWorkFactory;
