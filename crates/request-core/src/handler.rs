//! Handler / Processor trait 定义

use async_trait::async_trait;
use bookmart_auth_core::DecodedIdentity;
use bookmart_errors::AppResult;
use tokio_util::sync::CancellationToken;

use crate::request::Request;

/// 请求处理器（已组装完的入口形状）
///
/// 取消信号在每个挂起点都要被观察并向外传播，而不是吞掉；
/// 取消表现为独立的 Cancelled 结果，不是半截结果。
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(&self, request: R, cancel: &CancellationToken) -> AppResult<R::Result>;
}

/// 免授权处理器（登录、注册等没有既有身份的操作）
#[async_trait]
pub trait Processor<R: Request>: Send + Sync {
    async fn process(&self, request: R, cancel: &CancellationToken) -> AppResult<R::Result>;
}

/// 需授权处理器
///
/// 只有在管线完成解码与规则检查之后才会被调用，
/// 因而授权成功之前不可能发生任何共享状态的变更。
#[async_trait]
pub trait AuthorizedProcessor<R: Request>: Send + Sync {
    async fn process(
        &self,
        request: R,
        identity: &DecodedIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<R::Result>;
}
