//! 密码哈希值对象

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash as ParsedHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use bookmart_errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Argon2 密码哈希
///
/// 只存哈希串，明文在哈希或校验之后即丢弃。
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn hash(password: &str) -> AppResult<Self> {
        if password.len() < 8 {
            return Err(AppError::validation(
                "Password must be at least 8 characters",
            ));
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?;
        Ok(Self(hash.to_string()))
    }

    pub fn verify(&self, password: &str) -> bool {
        let Ok(parsed) = ParsedHash::new(&self.0) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// 从已持久化的哈希串恢复
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// 哈希串不进日志
impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash(****)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordHash::hash("correct horse battery").unwrap();
        assert!(hash.verify("correct horse battery"));
        assert!(!hash.verify("wrong password"));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(PasswordHash::hash("short").is_err());
    }

    #[test]
    fn test_debug_does_not_leak() {
        let hash = PasswordHash::hash("correct horse battery").unwrap();
        assert_eq!(format!("{:?}", hash), "PasswordHash(****)");
    }
}
