//! bookmart-errors - 统一错误处理
//!
//! 管线的五类失败（认证、授权、校验、未找到、取消）加上持久化失败，
//! 基于 RFC 7807 Problem Details 规范对外投影。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用错误类型
///
/// 所有层共用的错误和类型。调用方对变体做模式匹配，而不是捕获异常；
/// 管线遇到第一个错误即短路，内部不做任何重试。
#[derive(Debug, Error)]
pub enum AppError {
    /// 凭证缺失、格式错误、签名不合法或已过期
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// 身份合法但权限不足（NotEnoughRights）
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 构造参数非法（空白字段、越界分页等），构造时立即检查
    #[error("Validation error: {0}")]
    Validation(String),

    /// 按 id 查找未命中
    #[error("Not found: {0}")]
    NotFound(String),

    /// 协作式取消，与失败区分，不自动重试
    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// 持久化失败（含提交失败）。唯一一类调用方可以合理重试的错误。
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated(_) => 401,
            Self::Forbidden(_) => 403,
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            // 客户端关闭请求（nginx 约定）
            Self::Cancelled(_) => 499,
            Self::Conflict(_) => 409,
            Self::Database(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        ProblemDetails {
            r#type: self.problem_type(),
            title: self.problem_title(),
            status: self.status_code(),
            detail: self.to_string(),
            instance: None,
        }
    }

    fn problem_type(&self) -> String {
        let slug = match self {
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not-found",
            Self::Cancelled(_) => "cancelled",
            Self::Conflict(_) => "conflict",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        };
        format!("https://api.bookmart.dev/problems/{}", slug)
    }

    fn problem_title(&self) -> String {
        match self {
            Self::Unauthenticated(_) => "Unauthenticated",
            Self::Forbidden(_) => "Forbidden",
            Self::Validation(_) => "Validation Error",
            Self::NotFound(_) => "Resource Not Found",
            Self::Cancelled(_) => "Request Cancelled",
            Self::Conflict(_) => "Conflict",
            Self::Database(_) => "Database Error",
            Self::Internal(_) => "Internal Server Error",
        }
        .to_string()
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::unauthenticated("x").status_code(), 401);
        assert_eq!(AppError::forbidden("x").status_code(), 403);
        assert_eq!(AppError::validation("x").status_code(), 400);
        assert_eq!(AppError::not_found("x").status_code(), 404);
        assert_eq!(AppError::cancelled("x").status_code(), 499);
        assert_eq!(AppError::database("x").status_code(), 500);
    }

    #[test]
    fn test_problem_details() {
        let problem = AppError::forbidden("no rights on Order").to_problem_details();
        assert_eq!(problem.status, 403);
        assert_eq!(problem.title, "Forbidden");
        assert!(problem.r#type.ends_with("/forbidden"));
        assert!(problem.detail.contains("Order"));
    }

    #[test]
    fn test_problem_details_json_omits_empty_instance() {
        let problem = AppError::not_found("Book missing").to_problem_details();
        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["status"], 404);
        assert!(json.get("instance").is_none());
    }
}
