//! 图书目录查询

use async_trait::async_trait;
use bookmart_auth_core::DecodedIdentity;
use bookmart_common::{BookId, BookSorting, EntityType, OperationType, PagedResult, Pagination};
use bookmart_errors::{AppError, AppResult};
use bookmart_request_core::{AuthorizedProcessor, Request};
use tokio_util::sync::CancellationToken;

use crate::application::commands::catalog::CatalogService;
use crate::application::dto::BookDto;
use crate::application::ensure_live;

#[derive(Debug, Clone)]
pub struct GetBookQuery {
    pub book_id: BookId,
}

impl Request for GetBookQuery {
    type Result = BookDto;
    const ENTITY: EntityType = EntityType::Book;

    fn operation(&self) -> OperationType {
        OperationType::Get
    }
}

#[derive(Debug, Clone)]
pub struct ListBooksQuery {
    pub page: Pagination<BookSorting>,
}

impl Request for ListBooksQuery {
    type Result = PagedResult<BookDto>;
    const ENTITY: EntityType = EntityType::Book;

    fn operation(&self) -> OperationType {
        OperationType::Get
    }
}

#[async_trait]
impl AuthorizedProcessor<GetBookQuery> for CatalogService {
    async fn process(
        &self,
        request: GetBookQuery,
        _identity: &DecodedIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<BookDto> {
        ensure_live(cancel)?;
        let uow = self.uow_factory.begin().await?;
        let book = uow.books().find_by_id(&request.book_id).await?;
        uow.rollback().await?;

        book.map(BookDto::from)
            .ok_or_else(|| AppError::not_found(format!("Book {} not found", request.book_id)))
    }
}

#[async_trait]
impl AuthorizedProcessor<ListBooksQuery> for CatalogService {
    async fn process(
        &self,
        request: ListBooksQuery,
        _identity: &DecodedIdentity,
        cancel: &CancellationToken,
    ) -> AppResult<PagedResult<BookDto>> {
        ensure_live(cancel)?;
        let uow = self.uow_factory.begin().await?;
        let page = uow.books().find_page(&request.page).await?;
        uow.rollback().await?;

        Ok(page.map(BookDto::from))
    }
}
