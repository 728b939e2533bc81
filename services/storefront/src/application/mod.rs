//! 应用层：命令、查询与 DTO

pub mod commands;
pub mod dto;
pub mod queries;

use bookmart_errors::{AppError, AppResult};
use tokio_util::sync::CancellationToken;

/// 挂起点上的取消检查；提交前必须再查一次
pub(crate) fn ensure_live(cancel: &CancellationToken) -> AppResult<()> {
    if cancel.is_cancelled() {
        Err(AppError::cancelled("Request cancelled"))
    } else {
        Ok(())
    }
}
