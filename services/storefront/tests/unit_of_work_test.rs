//! Unit of Work 可见性与原子性测试

use bookmart_domain_core::Author;
use bookmart_errors::AppError;
use bookmart_ports::UnitOfWorkFactory;
use storefront::MemoryUnitOfWorkFactory;

fn author(first: &str, last: &str) -> Author {
    Author::new(first, last).unwrap()
}

#[tokio::test]
async fn test_changes_invisible_before_commit() {
    let factory = MemoryUnitOfWorkFactory::new();
    let writer = factory.begin().await.unwrap();
    let a = author("Ursula", "Le Guin");
    writer.authors().save(&a).await.unwrap();

    // 另一个工作单元看不到未提交的写入
    let reader = factory.begin().await.unwrap();
    assert!(reader.authors().find_by_id(&a.id).await.unwrap().is_none());

    writer.commit().await.unwrap();
    let reader = factory.begin().await.unwrap();
    assert!(reader.authors().find_by_id(&a.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_rollback_discards_all_writes() {
    let factory = MemoryUnitOfWorkFactory::new();
    let uow = factory.begin().await.unwrap();
    let a = author("Ursula", "Le Guin");
    let b = author("Italo", "Calvino");
    uow.authors().save(&a).await.unwrap();
    uow.authors().save(&b).await.unwrap();
    uow.rollback().await.unwrap();

    let reader = factory.begin().await.unwrap();
    assert!(reader.authors().find_by_id(&a.id).await.unwrap().is_none());
    assert!(reader.authors().find_by_id(&b.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_drop_without_commit_discards_writes() {
    let factory = MemoryUnitOfWorkFactory::new();
    let a = author("Ursula", "Le Guin");
    {
        let uow = factory.begin().await.unwrap();
        uow.authors().save(&a).await.unwrap();
        // 既不提交也不回滚
    }

    let reader = factory.begin().await.unwrap();
    assert!(reader.authors().find_by_id(&a.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_commit_is_all_or_nothing() {
    let factory = MemoryUnitOfWorkFactory::new();
    let a = author("Ursula", "Le Guin");
    let b = author("Italo", "Calvino");

    let uow = factory.begin().await.unwrap();
    uow.authors().save(&a).await.unwrap();
    uow.authors().save(&b).await.unwrap();
    uow.commit().await.unwrap();

    let reader = factory.begin().await.unwrap();
    assert!(reader.authors().find_by_id(&a.id).await.unwrap().is_some());
    assert!(reader.authors().find_by_id(&b.id).await.unwrap().is_some());
}

/// 交错提交按快照语义以后提交者为准，见 MemoryUnitOfWork 文档
#[tokio::test]
async fn test_interleaved_commits_keep_last_snapshot() {
    let factory = MemoryUnitOfWorkFactory::new();
    let a = author("Ursula", "Le Guin");
    let b = author("Italo", "Calvino");

    let first = factory.begin().await.unwrap();
    let second = factory.begin().await.unwrap();
    first.authors().save(&a).await.unwrap();
    second.authors().save(&b).await.unwrap();
    first.commit().await.unwrap();
    second.commit().await.unwrap();

    // 后提交的快照整体覆盖，先提交的写入不保留
    let reader = factory.begin().await.unwrap();
    assert!(reader.authors().find_by_id(&a.id).await.unwrap().is_none());
    assert!(reader.authors().find_by_id(&b.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_missing_reports_not_found() {
    let factory = MemoryUnitOfWorkFactory::new();
    let uow = factory.begin().await.unwrap();
    let err = uow
        .authors()
        .delete(&bookmart_common::AuthorId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
