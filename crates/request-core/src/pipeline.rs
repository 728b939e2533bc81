//! 先授权后执行的请求管线
//!
//! 固定顺序：解码令牌 -> 从请求导出操作描述符 -> 规则检查 -> 业务执行。
//! 认证严格先于授权，授权严格先于业务逻辑；第一个失败即短路，
//! 处理器在解码或规则检查失败后绝不会被调用。

use std::sync::Arc;

use async_trait::async_trait;
use bookmart_auth_core::{AuthToken, TokenService, check_rule, check_rule_for_role};
use bookmart_common::EmployeeRole;
use bookmart_errors::{AppError, AppResult};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::handler::{AuthorizedProcessor, Processor, RequestHandler};
use crate::request::Request;

/// 挂起点上的取消检查
fn ensure_live(cancel: &CancellationToken) -> AppResult<()> {
    if cancel.is_cancelled() {
        Err(AppError::cancelled("Request cancelled"))
    } else {
        Ok(())
    }
}

/// 免授权管线：把 Processor 组装成 RequestHandler
pub struct Pipeline<P> {
    inner: P,
}

impl<P> Pipeline<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R, P> RequestHandler<R> for Pipeline<P>
where
    R: Request + 'static,
    P: Processor<R>,
{
    async fn handle(&self, request: R, cancel: &CancellationToken) -> AppResult<R::Result> {
        ensure_live(cancel)?;
        self.inner.process(request, cancel).await
    }
}

/// 需授权管线：令牌编解码 + 规则检查 + 处理器的组合
pub struct AuthorizedPipeline<P> {
    tokens: Arc<TokenService>,
    inner: P,
}

impl<P> AuthorizedPipeline<P> {
    pub fn new(tokens: Arc<TokenService>, inner: P) -> Self {
        Self { tokens, inner }
    }

    /// 解码 -> 规则检查 -> 执行
    pub async fn execute<R>(
        &self,
        token: &AuthToken,
        request: R,
        cancel: &CancellationToken,
    ) -> AppResult<R::Result>
    where
        R: Request,
        P: AuthorizedProcessor<R>,
    {
        ensure_live(cancel)?;

        let descriptor = request.descriptor();

        let identity = self.tokens.decode(token).inspect_err(|e| {
            warn!(%descriptor, error = %e, "Token rejected");
            metrics::counter!("bookmart_requests_unauthenticated_total").increment(1);
        })?;

        check_rule(&identity, descriptor).inspect_err(|e| {
            warn!(%descriptor, kind = identity.kind().as_str(), error = %e, "Permission denied");
            metrics::counter!("bookmart_requests_forbidden_total").increment(1);
        })?;

        ensure_live(cancel)?;

        debug!(%descriptor, kind = identity.kind().as_str(), "Request authorized");
        metrics::counter!("bookmart_requests_authorized_total").increment(1);

        self.inner.process(request, &identity, cancel).await
    }

    /// 角色细分变体：在基础规则之上叠加角色掩码
    pub async fn execute_as<R>(
        &self,
        token: &AuthToken,
        role: EmployeeRole,
        request: R,
        cancel: &CancellationToken,
    ) -> AppResult<R::Result>
    where
        R: Request,
        P: AuthorizedProcessor<R>,
    {
        ensure_live(cancel)?;

        let descriptor = request.descriptor();

        let identity = self.tokens.decode(token).inspect_err(|e| {
            warn!(%descriptor, error = %e, "Token rejected");
            metrics::counter!("bookmart_requests_unauthenticated_total").increment(1);
        })?;

        check_rule_for_role(&identity, role, descriptor).inspect_err(|e| {
            warn!(%descriptor, ?role, error = %e, "Permission denied for role");
            metrics::counter!("bookmart_requests_forbidden_total").increment(1);
        })?;

        ensure_live(cancel)?;

        self.inner.process(request, &identity, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmart_auth_core::DecodedIdentity;
    use bookmart_common::{CustomerId, Email, EmployeeId, EntityType, Login, OperationType};
    use mockall::mock;

    /// 测试用请求：(Order, Update)
    struct UpdateOrderRequest;

    impl Request for UpdateOrderRequest {
        type Result = ();

        const ENTITY: EntityType = EntityType::Order;

        fn operation(&self) -> OperationType {
            OperationType::Update
        }
    }

    /// 测试用请求：(Order, Delete) —— 员工掩码之外
    struct DeleteOrderRequest;

    impl Request for DeleteOrderRequest {
        type Result = ();

        const ENTITY: EntityType = EntityType::Order;

        fn operation(&self) -> OperationType {
            OperationType::Delete
        }
    }

    mock! {
        UpdateProcessor {}

        #[async_trait]
        impl AuthorizedProcessor<UpdateOrderRequest> for UpdateProcessor {
            async fn process(
                &self,
                request: UpdateOrderRequest,
                identity: &DecodedIdentity,
                cancel: &CancellationToken,
            ) -> AppResult<()>;
        }
    }

    mock! {
        DeleteProcessor {}

        #[async_trait]
        impl AuthorizedProcessor<DeleteOrderRequest> for DeleteProcessor {
            async fn process(
                &self,
                request: DeleteOrderRequest,
                identity: &DecodedIdentity,
                cancel: &CancellationToken,
            ) -> AppResult<()>;
        }
    }

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new(
            "pipeline-test-secret",
            3600,
            "bookmart".to_string(),
            "bookmart-api".to_string(),
        ))
    }

    fn employee_token(tokens: &TokenService) -> AuthToken {
        tokens
            .issue(&DecodedIdentity::Employee {
                id: EmployeeId::new(),
                login: Login::new("mgr1").unwrap(),
            })
            .unwrap()
    }

    fn customer_token(tokens: &TokenService) -> AuthToken {
        tokens
            .issue(&DecodedIdentity::Customer {
                id: CustomerId::new(),
                email: Email::new("reader@example.com").unwrap(),
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_authorized_request_reaches_processor() {
        let tokens = tokens();
        let token = employee_token(&tokens);

        let mut processor = MockUpdateProcessor::new();
        processor.expect_process().times(1).returning(|_, _, _| Ok(()));

        let pipeline = AuthorizedPipeline::new(tokens, processor);
        let result = pipeline
            .execute(&token, UpdateOrderRequest, &CancellationToken::new())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_token_skips_rule_check_and_processor() {
        let tokens = tokens();
        let token = AuthToken::new("not-a-jwt").unwrap();

        // 不设置任何期望：处理器若被调用，mock 直接 panic
        let processor = MockUpdateProcessor::new();

        let pipeline = AuthorizedPipeline::new(tokens, processor);
        let err = pipeline
            .execute(&token, UpdateOrderRequest, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_denied_request_never_reaches_processor() {
        let tokens = tokens();
        let token = employee_token(&tokens);

        let processor = MockDeleteProcessor::new();

        let pipeline = AuthorizedPipeline::new(tokens, processor);
        let err = pipeline
            .execute(&token, DeleteOrderRequest, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_customer_token_denied_on_internal_aggregate() {
        let tokens = tokens();
        let token = customer_token(&tokens);

        let processor = MockDeleteProcessor::new();

        let pipeline = AuthorizedPipeline::new(tokens, processor);
        // 顾客可以改自己的订单，但删除订单默认拒绝
        let err = pipeline
            .execute(&token, DeleteOrderRequest, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_cancelled_before_decode_surfaces_cancelled() {
        let tokens = tokens();
        let token = employee_token(&tokens);

        let processor = MockUpdateProcessor::new();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let pipeline = AuthorizedPipeline::new(tokens, processor);
        let err = pipeline
            .execute(&token, UpdateOrderRequest, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Cancelled(_)));
    }

    #[tokio::test]
    async fn test_role_overlay_blocks_cashier() {
        let tokens = tokens();
        let token = employee_token(&tokens);

        // Cashier 对 Order 有 Get|Update，Update 请求应当到达处理器
        let mut processor = MockUpdateProcessor::new();
        processor.expect_process().times(1).returning(|_, _, _| Ok(()));

        let pipeline = AuthorizedPipeline::new(tokens.clone(), processor);
        assert!(
            pipeline
                .execute_as(
                    &token,
                    EmployeeRole::Cashier,
                    UpdateOrderRequest,
                    &CancellationToken::new()
                )
                .await
                .is_ok()
        );

        // Delete 在基础掩码之外，Manager 角色也救不回来
        let pipeline = AuthorizedPipeline::new(tokens, MockDeleteProcessor::new());
        assert!(
            pipeline
                .execute_as(
                    &token,
                    EmployeeRole::Manager,
                    DeleteOrderRequest,
                    &CancellationToken::new()
                )
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_descriptor_derived_from_payload_type() {
        let request = UpdateOrderRequest;
        let descriptor = request.descriptor();
        assert_eq!(descriptor.entity, EntityType::Order);
        assert_eq!(descriptor.operation, OperationType::Update);
    }
}
