//! bookmart-domain-core - 领域模型库
//!
//! 市场域的聚合与值对象。

pub mod catalog;
pub mod entity;
pub mod locations;
pub mod money;
pub mod orders;
pub mod parties;
pub mod password;

pub use catalog::*;
pub use entity::*;
pub use locations::*;
pub use money::*;
pub use orders::*;
pub use parties::*;
pub use password::*;
