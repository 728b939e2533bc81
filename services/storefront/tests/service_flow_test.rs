//! 端到端业务流测试：注册登录 -> 目录维护 -> 订单流转
//!
//! 全程走真实管线（令牌解码 + 规则检查 + 处理器），
//! 存储使用内存 Unit of Work。

use std::sync::Arc;

use bookmart_auth_core::TokenService;
use bookmart_common::{BookSorting, EmployeeRole, Login, Pagination};
use bookmart_domain_core::{Employee, Money, Order, OrderStatus};
use bookmart_errors::AppError;
use bookmart_ports::UnitOfWorkFactory;
use bookmart_request_core::{AuthorizedPipeline, Pipeline, RequestHandler};
use tokio_util::sync::CancellationToken;

use storefront::{
    AddBookCommand, AuthService, CatalogService, DeleteBookCommand, GetBookQuery, GetOrderQuery,
    ListBooksQuery, LoginCustomerCommand, LoginEmployeeCommand, MemoryUnitOfWorkFactory,
    OrderService, RegisterCustomerCommand, UpdateBookCommand, UpdateOrderStatusCommand,
    UpsertAuthorCommand,
};

fn token_service() -> Arc<TokenService> {
    Arc::new(TokenService::new(
        "flow-test-secret",
        3600,
        "bookmart".to_string(),
        "bookmart-clients".to_string(),
    ))
}

struct Harness {
    factory: Arc<MemoryUnitOfWorkFactory>,
    tokens: Arc<TokenService>,
}

impl Harness {
    fn new() -> Self {
        bookmart_telemetry::try_init_tracing("debug");
        Self {
            factory: Arc::new(MemoryUnitOfWorkFactory::new()),
            tokens: token_service(),
        }
    }

    fn auth(&self) -> Pipeline<AuthService> {
        Pipeline::new(AuthService::new(self.factory.clone(), self.tokens.clone()))
    }

    fn catalog(&self) -> AuthorizedPipeline<CatalogService> {
        AuthorizedPipeline::new(self.tokens.clone(), CatalogService::new(self.factory.clone()))
    }

    fn orders(&self) -> AuthorizedPipeline<OrderService> {
        AuthorizedPipeline::new(self.tokens.clone(), OrderService::new(self.factory.clone()))
    }

    async fn seed_employee(&self, login: &str, role: EmployeeRole) {
        let employee = Employee::new(
            Login::new(login).unwrap(),
            "Seed Employee",
            role,
            "employee-pass",
        )
        .unwrap();
        let uow = self.factory.begin().await.unwrap();
        uow.employees().save(&employee).await.unwrap();
        uow.commit().await.unwrap();
    }
}

#[tokio::test]
async fn test_register_then_login_issues_token() {
    let harness = Harness::new();
    let cancel = CancellationToken::new();
    let auth = harness.auth();

    let customer_id = auth
        .handle(
            RegisterCustomerCommand {
                email: "Reader@Example.com".to_string(),
                password: "secret-pass".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap();

    // 邮箱归一为小写，重复注册冲突
    let err = auth
        .handle(
            RegisterCustomerCommand {
                email: "reader@example.com".to_string(),
                password: "other-pass".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let authenticated = auth
        .handle(
            LoginCustomerCommand {
                email: "reader@example.com".to_string(),
                password: "secret-pass".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(authenticated.user_id, customer_id);
}

#[tokio::test]
async fn test_login_rejects_bad_password_and_unknown_user() {
    let harness = Harness::new();
    let cancel = CancellationToken::new();
    let auth = harness.auth();

    auth.handle(
        RegisterCustomerCommand {
            email: "reader@example.com".to_string(),
            password: "secret-pass".to_string(),
        },
        &cancel,
    )
    .await
    .unwrap();

    let wrong_password = auth
        .handle(
            LoginCustomerCommand {
                email: "reader@example.com".to_string(),
                password: "wrong".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap_err();
    let unknown_user = auth
        .handle(
            LoginCustomerCommand {
                email: "nobody@example.com".to_string(),
                password: "secret-pass".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap_err();

    // 两种失败不可区分
    assert!(matches!(wrong_password, AppError::Unauthenticated(_)));
    assert!(matches!(unknown_user, AppError::Unauthenticated(_)));
}

#[tokio::test]
async fn test_employee_maintains_catalog_end_to_end() {
    let harness = Harness::new();
    let cancel = CancellationToken::new();
    harness.seed_employee("clerk_1", EmployeeRole::Manager).await;

    let employee = harness
        .auth()
        .handle(
            LoginEmployeeCommand {
                login: "clerk_1".to_string(),
                password: "employee-pass".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap();
    let token = employee.token;
    let catalog = harness.catalog();

    // GetOrAdd：第一次创建，第二次返回同一作者
    let author_id = catalog
        .execute(
            &token,
            UpsertAuthorCommand {
                first_name: "Ursula".to_string(),
                last_name: "Le Guin".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap();
    let again = catalog
        .execute(
            &token,
            UpsertAuthorCommand {
                first_name: "Ursula".to_string(),
                last_name: "Le Guin".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(author_id, again);

    let book_id = catalog
        .execute(
            &token,
            AddBookCommand {
                title: "The Dispossessed".to_string(),
                author_id,
                price_cents: 1999,
                currency: "USD".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap();

    catalog
        .execute(
            &token,
            UpdateBookCommand {
                book_id,
                title: None,
                price_cents: Some(1499),
            },
            &cancel,
        )
        .await
        .unwrap();

    let book = catalog
        .execute(&token, GetBookQuery { book_id }, &cancel)
        .await
        .unwrap();
    assert_eq!(book.price_cents, 1499);
    assert_eq!(book.title, "The Dispossessed");

    let page = catalog
        .execute(
            &token,
            ListBooksQuery {
                page: Pagination::new(1, 10, BookSorting::Title).unwrap(),
            },
            &cancel,
        )
        .await
        .unwrap();
    assert_eq!(page.total(), 1);

    catalog
        .execute(&token, DeleteBookCommand { book_id }, &cancel)
        .await
        .unwrap();
    let err = catalog
        .execute(&token, GetBookQuery { book_id }, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_customer_cannot_modify_catalog() {
    let harness = Harness::new();
    let cancel = CancellationToken::new();
    let auth = harness.auth();

    auth.handle(
        RegisterCustomerCommand {
            email: "reader@example.com".to_string(),
            password: "secret-pass".to_string(),
        },
        &cancel,
    )
    .await
    .unwrap();
    let customer = auth
        .handle(
            LoginCustomerCommand {
                email: "reader@example.com".to_string(),
                password: "secret-pass".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap();

    let err = harness
        .catalog()
        .execute(
            &customer.token,
            UpsertAuthorCommand {
                first_name: "Ursula".to_string(),
                last_name: "Le Guin".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_order_ownership_and_status_flow() {
    let harness = Harness::new();
    let cancel = CancellationToken::new();
    harness.seed_employee("clerk_1", EmployeeRole::Manager).await;
    let auth = harness.auth();

    auth.handle(
        RegisterCustomerCommand {
            email: "owner@example.com".to_string(),
            password: "secret-pass".to_string(),
        },
        &cancel,
    )
    .await
    .unwrap();
    auth.handle(
        RegisterCustomerCommand {
            email: "other@example.com".to_string(),
            password: "secret-pass".to_string(),
        },
        &cancel,
    )
    .await
    .unwrap();

    let owner = auth
        .handle(
            LoginCustomerCommand {
                email: "owner@example.com".to_string(),
                password: "secret-pass".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap();
    let other = auth
        .handle(
            LoginCustomerCommand {
                email: "other@example.com".to_string(),
                password: "secret-pass".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap();
    let employee = auth
        .handle(
            LoginEmployeeCommand {
                login: "clerk_1".to_string(),
                password: "employee-pass".to_string(),
            },
            &cancel,
        )
        .await
        .unwrap();

    // 直接种一笔归 owner 的订单
    let order = Order::place(
        owner.user_id,
        bookmart_common::ShopId::new(),
        Money::usd(4999),
    )
    .unwrap();
    let order_id = order.id;
    let uow = harness.factory.begin().await.unwrap();
    uow.orders().save(&order).await.unwrap();
    uow.commit().await.unwrap();

    let orders = harness.orders();

    // 本人可见，他人不可见
    let dto = orders
        .execute(&owner.token, GetOrderQuery { order_id }, &cancel)
        .await
        .unwrap();
    assert_eq!(dto.customer_id, owner.user_id);
    let err = orders
        .execute(&other.token, GetOrderQuery { order_id }, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // 顾客只能取消，不能推进发货
    let err = orders
        .execute(
            &owner.token,
            UpdateOrderStatusCommand {
                order_id,
                status: OrderStatus::Shipped,
            },
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // 员工推进状态
    orders
        .execute(
            &employee.token,
            UpdateOrderStatusCommand {
                order_id,
                status: OrderStatus::Completed,
            },
            &cancel,
        )
        .await
        .unwrap();

    // 终态之后不再流转
    let err = orders
        .execute(
            &employee.token,
            UpdateOrderStatusCommand {
                order_id,
                status: OrderStatus::Cancelled,
            },
            &cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_cancelled_request_short_circuits() {
    let harness = Harness::new();
    harness.seed_employee("clerk_1", EmployeeRole::Manager).await;
    let live = CancellationToken::new();

    let employee = harness
        .auth()
        .handle(
            LoginEmployeeCommand {
                login: "clerk_1".to_string(),
                password: "employee-pass".to_string(),
            },
            &live,
        )
        .await
        .unwrap();

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    let err = harness
        .catalog()
        .execute(
            &employee.token,
            UpsertAuthorCommand {
                first_name: "Ursula".to_string(),
                last_name: "Le Guin".to_string(),
            },
            &cancelled,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Cancelled(_)));
}
