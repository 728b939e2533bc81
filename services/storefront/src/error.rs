//! 服务错误定义

use bookmart_errors::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthFlowError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Login already taken")]
    LoginTaken,
}

impl From<AuthFlowError> for AppError {
    fn from(err: AuthFlowError) -> Self {
        match err {
            AuthFlowError::InvalidCredentials => AppError::unauthenticated("Invalid credentials"),
            AuthFlowError::EmailTaken => AppError::conflict("Email already registered"),
            AuthFlowError::LoginTaken => AppError::conflict("Login already taken"),
        }
    }
}
