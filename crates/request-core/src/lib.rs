//! bookmart-request-core - 请求契约与授权管线
//!
//! Request / Handler / Processor trait 与先授权后执行的组装。

pub mod handler;
pub mod pipeline;
pub mod request;

pub use handler::*;
pub use pipeline::*;
pub use request::*;
