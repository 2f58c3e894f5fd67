use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{LinktrailError, Result};

/// 将 bearer token 解析为数值 owner ID
pub trait PrincipalResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Result<i64>;

    /// 为登录成功的用户签发令牌；只做校验的实现可以不支持
    fn issue(&self, owner_id: i64, _ttl: Duration) -> Result<String> {
        Err(LinktrailError::service_unavailable(format!(
            "token issuance is not available (owner {})",
            owner_id
        )))
    }
}

/// Token Claims
///
/// 兼容两种签发方式：`sub` 为十进制字符串，或数值型 `user_id`。
#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
}

impl OwnerClaims {
    fn owner_id(&self) -> Option<i64> {
        self.user_id
            .or_else(|| self.sub.as_deref().and_then(|s| s.parse().ok()))
    }
}

/// HS256 JWT 校验
pub struct JwtPrincipal {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtPrincipal {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// 签发一个 `user_id` 形式的令牌
    pub fn issue(&self, owner_id: i64, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = OwnerClaims {
            sub: None,
            user_id: Some(owner_id),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| LinktrailError::invalid_input(format!("failed to sign token: {}", e)))
    }
}

impl PrincipalResolver for JwtPrincipal {
    fn resolve(&self, token: &str) -> Result<i64> {
        let data = decode::<OwnerClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!("Token validation failed: {}", e);
                LinktrailError::unauthorized("invalid token")
            })?;

        data.claims
            .owner_id()
            .ok_or_else(|| LinktrailError::unauthorized("invalid token"))
    }

    fn issue(&self, owner_id: i64, ttl: Duration) -> Result<String> {
        JwtPrincipal::issue(self, owner_id, ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_32_bytes_long!!";

    fn sign(claims: &OwnerClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_resolve() {
        let jwt = JwtPrincipal::new(SECRET);
        let token = jwt.issue(42, Duration::minutes(5)).unwrap();
        assert_eq!(jwt.resolve(&token).unwrap(), 42);
    }

    #[test]
    fn test_issue_through_trait_object() {
        let principal: Box<dyn PrincipalResolver> = Box::new(JwtPrincipal::new(SECRET));
        let token = principal.issue(8, Duration::minutes(5)).unwrap();
        assert_eq!(principal.resolve(&token).unwrap(), 8);
    }

    #[test]
    fn test_sub_claim_accepted() {
        let jwt = JwtPrincipal::new(SECRET);
        let claims = OwnerClaims {
            sub: Some("17".to_string()),
            user_id: None,
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        };
        assert_eq!(jwt.resolve(&sign(&claims, SECRET)).unwrap(), 17);
    }

    #[test]
    fn test_non_numeric_sub_rejected() {
        let jwt = JwtPrincipal::new(SECRET);
        let claims = OwnerClaims {
            sub: Some("admin".to_string()),
            user_id: None,
            iat: Utc::now().timestamp(),
            exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        };
        assert!(matches!(
            jwt.resolve(&sign(&claims, SECRET)),
            Err(LinktrailError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtPrincipal::new(SECRET)
            .issue(1, Duration::minutes(5))
            .unwrap();
        let other = JwtPrincipal::new("different_secret_key_32_bytes!!");
        assert!(other.resolve(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = JwtPrincipal::new(SECRET);
        // 超过默认 leeway
        let token = jwt.issue(1, Duration::hours(-1)).unwrap();
        assert!(jwt.resolve(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let jwt = JwtPrincipal::new(SECRET);
        assert!(jwt.resolve("invalid.token.here").is_err());
    }
}
