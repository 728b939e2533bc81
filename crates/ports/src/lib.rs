//! bookmart-ports - 持久化端口定义

pub mod repository;
pub mod unit_of_work;

pub use repository::*;
pub use unit_of_work::*;
