//! # 登录会话
//!
//! 绑定完成后签发 HS256 JWT 会话 Cookie

use crate::error::{OauthError, Result};
use chrono::Utc;
use entity::local_accounts;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// 会话 Cookie 名称
pub const SESSION_COOKIE: &str = "blog_session";

const SESSION_TTL_SECS: i64 = 7 * 24 * 3600;

/// 会话声明
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// 本地账户 id
    pub account_id: i32,
    pub username: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// 会话签发器
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SessionIssuer {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["blog-oauth"]);
        validation.validate_exp = true;
        validation.leeway = 30;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// 为账户签发会话令牌
    pub fn issue(&self, account: &local_accounts::Model) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            account_id: account.id,
            username: account.username.clone(),
            iss: "blog-oauth".to_string(),
            iat: now,
            exp: now + SESSION_TTL_SECS,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| OauthError::Session(format!("会话令牌签发失败: {e}")))
    }

    /// 生成 Set-Cookie 值
    pub fn session_cookie(&self, account: &local_accounts::Model) -> Result<String> {
        let token = self.issue(account)?;
        Ok(format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_TTL_SECS}"
        ))
    }

    /// 校验并解析会话令牌
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| OauthError::Session(format!("会话令牌无效: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> local_accounts::Model {
        let now = Utc::now().naive_utc();
        local_accounts::Model {
            id: 11,
            username: "octocat".to_string(),
            email: Some("octo@example.com".to_string()),
            source: "authorize".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issue_then_validate_round_trip() {
        let issuer = SessionIssuer::new("0123456789abcdef0123456789abcdef");
        let token = issuer.issue(&account()).unwrap();
        let claims = issuer.validate(&token).unwrap();
        assert_eq!(claims.account_id, 11);
        assert_eq!(claims.username, "octocat");
    }

    #[test]
    fn validate_rejects_other_secret() {
        let issuer = SessionIssuer::new("0123456789abcdef0123456789abcdef");
        let other = SessionIssuer::new("fedcba9876543210fedcba9876543210");
        let token = issuer.issue(&account()).unwrap();
        assert!(other.validate(&token).is_err());
    }

    #[test]
    fn session_cookie_is_http_only() {
        let issuer = SessionIssuer::new("0123456789abcdef0123456789abcdef");
        let cookie = issuer.session_cookie(&account()).unwrap();
        assert!(cookie.starts_with("blog_session="));
        assert!(cookie.contains("HttpOnly"));
    }
}
