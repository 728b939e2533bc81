//! 身份令牌编解码
//!
//! JWT (HS256) 往返：签发时把 DecodedIdentity 序列化进 Claims，
//! 校验时验证签名 / 过期 / 签发者 / 受众后还原变体。

use bookmart_common::{CustomerId, Email, EmployeeId, Login};
use bookmart_config::AuthConfig;
use bookmart_errors::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::{DecodedIdentity, IdentityKind};

/// 不透明的身份令牌
///
/// 核心只要求它非空且非纯空白；结构全部在解码后的载荷里。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthToken(String);

impl AuthToken {
    /// 从入站凭证构造。空白令牌直接按认证失败处理。
    pub fn new(raw: impl Into<String>) -> AppResult<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(AppError::unauthenticated("Bearer token must not be blank"));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// 身份种类（customer / employee）
    pub kind: String,
    /// 顾客邮箱（仅 customer）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// 员工登录名（仅 employee）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    pub iat: i64,
    /// JWT ID
    pub jti: String,
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Audience
    #[serde(default)]
    pub aud: String,
}

impl Claims {
    fn new(identity: &DecodedIdentity, expires_in_secs: i64, issuer: &str, audience: &str) -> Self {
        let now = Utc::now();
        let (sub, kind, email, login) = match identity {
            DecodedIdentity::Customer { id, email } => (
                id.to_string(),
                IdentityKind::Customer,
                Some(email.as_str().to_string()),
                None,
            ),
            DecodedIdentity::Employee { id, login } => (
                id.to_string(),
                IdentityKind::Employee,
                None,
                Some(login.as_str().to_string()),
            ),
        };
        Self {
            sub,
            kind: kind.as_str().to_string(),
            email,
            login,
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
        }
    }

    /// 从已验证的 Claims 还原身份变体
    fn into_identity(self) -> AppResult<DecodedIdentity> {
        match self.kind.as_str() {
            "customer" => {
                let id = CustomerId::from_string(&self.sub)
                    .map_err(|_| AppError::unauthenticated("Invalid customer ID in token"))?;
                let email = self
                    .email
                    .ok_or_else(|| AppError::unauthenticated("Customer token missing email"))?;
                let email = Email::new(email)
                    .map_err(|_| AppError::unauthenticated("Invalid email in token"))?;
                Ok(DecodedIdentity::Customer { id, email })
            }
            "employee" => {
                let id = EmployeeId::from_string(&self.sub)
                    .map_err(|_| AppError::unauthenticated("Invalid employee ID in token"))?;
                let login = self
                    .login
                    .ok_or_else(|| AppError::unauthenticated("Employee token missing login"))?;
                let login = Login::new(login)
                    .map_err(|_| AppError::unauthenticated("Invalid login in token"))?;
                Ok(DecodedIdentity::Employee { id, login })
            }
            other => Err(AppError::unauthenticated(format!(
                "Unknown identity kind in token: {}",
                other
            ))),
        }
    }
}

/// Token 服务
///
/// 签发与校验都是对输入的纯函数，除密码学验证外不产生副作用。
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in_secs: i64,
    issuer: String,
    audience: String,
}

impl TokenService {
    pub fn new(secret: &str, expires_in_secs: i64, issuer: String, audience: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in_secs,
            issuer,
            audience,
        }
    }

    /// 从应用配置构造
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.secret.expose_secret(),
            i64::try_from(config.expires_in).unwrap_or(i64::MAX),
            config.issuer.clone(),
            config.audience.clone(),
        )
    }

    /// 签发令牌
    pub fn issue(&self, identity: &DecodedIdentity) -> AppResult<AuthToken> {
        let claims = Claims::new(identity, self.expires_in_secs, &self.issuer, &self.audience);

        let raw = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to issue token: {}", e)))?;

        AuthToken::new(raw)
    }

    /// 校验令牌并还原身份
    ///
    /// 任何失败（格式损坏、签名不符、已过期、签发者/受众不匹配）
    /// 都归为认证失败，绝不静默放行。
    pub fn decode(&self, token: &AuthToken) -> AppResult<DecodedIdentity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<Claims>(token.as_str(), &self.decoding_key, &validation)
            .map_err(|e| AppError::unauthenticated(format!("Invalid token: {}", e)))?;

        let claims = token_data.claims;

        if claims.jti.is_empty() {
            return Err(AppError::unauthenticated("Token ID (jti) missing"));
        }

        claims.into_identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            "test-secret",
            3600,
            "bookmart".to_string(),
            "bookmart-api".to_string(),
        )
    }

    fn customer_identity() -> DecodedIdentity {
        DecodedIdentity::Customer {
            id: CustomerId::new(),
            email: Email::new("reader@example.com").unwrap(),
        }
    }

    fn employee_identity() -> DecodedIdentity {
        DecodedIdentity::Employee {
            id: EmployeeId::new(),
            login: Login::new("mgr1").unwrap(),
        }
    }

    #[test]
    fn test_customer_round_trip() {
        let svc = service();
        let identity = customer_identity();
        let token = svc.issue(&identity).unwrap();
        assert_eq!(svc.decode(&token).unwrap(), identity);
    }

    #[test]
    fn test_service_from_config_round_trips() {
        let config = AuthConfig {
            secret: secrecy::Secret::new("config-secret".to_string()),
            expires_in: 600,
            issuer: "bookmart".to_string(),
            audience: "bookmart-clients".to_string(),
        };
        let svc = TokenService::from_config(&config);
        let identity = customer_identity();
        let token = svc.issue(&identity).unwrap();
        assert_eq!(svc.decode(&token).unwrap(), identity);
    }

    #[test]
    fn test_employee_round_trip() {
        let svc = service();
        let identity = employee_identity();
        let token = svc.issue(&identity).unwrap();
        assert_eq!(svc.decode(&token).unwrap(), identity);
    }

    #[test]
    fn test_malformed_token_rejected() {
        let svc = service();
        let token = AuthToken::new("not-a-jwt").unwrap();
        let err = svc.decode(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[test]
    fn test_wrong_signature_rejected() {
        let svc = service();
        let other = TokenService::new(
            "other-secret",
            3600,
            "bookmart".to_string(),
            "bookmart-api".to_string(),
        );
        let token = other.issue(&customer_identity()).unwrap();
        assert!(matches!(
            svc.decode(&token),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let expired = TokenService::new(
            "test-secret",
            -60,
            "bookmart".to_string(),
            "bookmart-api".to_string(),
        );
        let token = expired.issue(&employee_identity()).unwrap();
        assert!(matches!(
            service().decode(&token),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let other = TokenService::new(
            "test-secret",
            3600,
            "someone-else".to_string(),
            "bookmart-api".to_string(),
        );
        let token = other.issue(&customer_identity()).unwrap();
        assert!(matches!(
            service().decode(&token),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_blank_token_rejected() {
        assert!(AuthToken::new("").is_err());
        assert!(AuthToken::new("   ").is_err());
    }

    #[test]
    fn test_variant_tag_is_stable() {
        let svc = service();
        let token = svc.issue(&employee_identity()).unwrap();
        let decoded = svc.decode(&token).unwrap();
        assert!(matches!(decoded, DecodedIdentity::Employee { .. }));
    }
}
