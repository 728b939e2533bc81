//! 作者与图书目录维护命令
//!
//! 全部走需授权管线；管线完成规则检查之前这里的代码不会执行。

use std::sync::Arc;

use async_trait::async_trait;
use bookmart_auth_core::DecodedIdentity;
use bookmart_common::{AuthorId, BookId, EntityType, OperationType};
use bookmart_domain_core::{Author, Book, Currency, Money};
use bookmart_errors::{AppError, AppResult};
use bookmart_ports::UnitOfWorkFactory;
use bookmart_request_core::{AuthorizedProcessor, Request};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::ensure_live;

/// 按姓名取作者，不存在则创建
///
/// GetOrAdd 是独立的复合操作：调用方须同时持有 Get 与 Add 两个权限位。
#[derive(Debug, Clone)]
pub struct UpsertAuthorCommand {
    pub first_name: String,
    pub last_name: String,
}

impl Request for UpsertAuthorCommand {
    type Result = AuthorId;
    const ENTITY: EntityType = EntityType::Author;

    fn operation(&self) -> OperationType {
        OperationType::GetOrAdd
    }
}

#[derive(Debug, Clone)]
pub struct AddBookCommand {
    pub title: String,
    pub author_id: AuthorId,
    pub price_cents: i64,
    pub currency: String,
}

impl Request for AddBookCommand {
    type Result = BookId;
    const ENTITY: EntityType = EntityType::Book;

    fn operation(&self) -> OperationType {
        OperationType::Add
    }
}

/// 改名或改价；None 字段保持不变
#[derive(Debug, Clone)]
pub struct UpdateBookCommand {
    pub book_id: BookId,
    pub title: Option<String>,
    pub price_cents: Option<i64>,
}

impl Request for UpdateBookCommand {
    type Result = ();
    const ENTITY: EntityType = EntityType::Book;

    fn operation(&self) -> OperationType {
        OperationType::Update
    }
}

#[derive(Debug, Clone)]
pub struct DeleteBookCommand {
    pub book_id: BookId,
}

impl Request for DeleteBookCommand {
    type Result = ();
    const ENTITY: EntityType = EntityType::Book;

    fn operation(&self) -> OperationType {
        OperationType::Delete
    }
}

/// 目录服务
pub struct CatalogService {
    pub(crate) uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl CatalogService {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }
}

#[async_trait]
impl AuthorizedProcessor<UpsertAuthorCommand> for CatalogService {
    async fn process(
        &self,
        request: UpsertAuthorCommand,
        _identity: &DecodedIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<AuthorId> {
        let uow = self.uow_factory.begin().await?;

        if let Some(existing) = uow
            .authors()
            .find_by_name(&request.first_name, &request.last_name)
            .await?
        {
            uow.rollback().await?;
            return Ok(existing.id);
        }

        let author = Author::new(request.first_name, request.last_name)?;
        let id = author.id;
        uow.authors().save(&author).await?;

        if let Err(e) = ensure_live(cancel) {
            uow.rollback().await?;
            return Err(e);
        }
        uow.commit().await?;

        info!(author_id = %id, "Author created");
        Ok(id)
    }
}

#[async_trait]
impl AuthorizedProcessor<AddBookCommand> for CatalogService {
    async fn process(
        &self,
        request: AddBookCommand,
        _identity: &DecodedIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<BookId> {
        let uow = self.uow_factory.begin().await?;

        // 外键先行校验，给出比数据库约束错误更可读的结果
        if !uow.authors().exists(&request.author_id).await? {
            uow.rollback().await?;
            return Err(AppError::not_found(format!(
                "Author {} not found",
                request.author_id
            )));
        }

        let price = Money::new(request.price_cents, Currency::new(&request.currency));
        let book = Book::new(request.title, request.author_id, price)?;
        let id = book.id;
        uow.books().save(&book).await?;

        if let Err(e) = ensure_live(cancel) {
            uow.rollback().await?;
            return Err(e);
        }
        uow.commit().await?;

        info!(book_id = %id, "Book added");
        Ok(id)
    }
}

#[async_trait]
impl AuthorizedProcessor<UpdateBookCommand> for CatalogService {
    async fn process(
        &self,
        request: UpdateBookCommand,
        _identity: &DecodedIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        let uow = self.uow_factory.begin().await?;

        let mut book = match uow.books().find_by_id(&request.book_id).await? {
            Some(book) => book,
            None => {
                uow.rollback().await?;
                return Err(AppError::not_found(format!(
                    "Book {} not found",
                    request.book_id
                )));
            }
        };

        if let Some(title) = request.title {
            book.rename(title)?;
        }
        if let Some(cents) = request.price_cents {
            let currency = book.price.currency.clone();
            book.reprice(Money::new(cents, currency))?;
        }
        uow.books().save(&book).await?;

        if let Err(e) = ensure_live(cancel) {
            uow.rollback().await?;
            return Err(e);
        }
        uow.commit().await?;

        info!(book_id = %request.book_id, "Book updated");
        Ok(())
    }
}

#[async_trait]
impl AuthorizedProcessor<DeleteBookCommand> for CatalogService {
    async fn process(
        &self,
        request: DeleteBookCommand,
        _identity: &DecodedIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        let uow = self.uow_factory.begin().await?;

        if let Err(e) = uow.books().delete(&request.book_id).await {
            uow.rollback().await?;
            return Err(e);
        }

        if let Err(e) = ensure_live(cancel) {
            uow.rollback().await?;
            return Err(e);
        }
        uow.commit().await?;

        info!(book_id = %request.book_id, "Book deleted");
        Ok(())
    }
}
