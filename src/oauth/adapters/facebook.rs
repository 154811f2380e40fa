//! # Facebook 适配器
//!
//! 标准 JSON 令牌响应；头像藏在 `picture.data.url` 嵌套结构里。
//! Facebook 令牌过长，不随身份入库。出站请求经共享客户端的可选代理。

use crate::error::{OauthError, Result};
use crate::oauth::adapter::{
    CanonicalProfile, OauthAdapter, ProviderEndpoints, ProviderSettings, TokenGrant, build_url,
};
use crate::oauth::adapters::{non_empty_str, value_to_string};
use crate::oauth::{OauthHttpClient, ProviderKind};
use async_trait::async_trait;
use serde_json::Value;

const AUTH_URL: &str = "https://www.facebook.com/v16.0/dialog/oauth";
const TOKEN_URL: &str = "https://graph.facebook.com/v16.0/oauth/access_token";
const API_URL: &str = "https://graph.facebook.com/me";

/// Facebook OAuth2 适配器
pub struct FacebookAdapter {
    settings: ProviderSettings,
    http: OauthHttpClient,
    endpoints: ProviderEndpoints,
}

impl FacebookAdapter {
    pub fn new(settings: ProviderSettings, http: OauthHttpClient) -> Self {
        Self::with_endpoints(
            settings,
            http,
            ProviderEndpoints {
                auth_url: AUTH_URL.to_string(),
                token_url: TOKEN_URL.to_string(),
                api_url: API_URL.to_string(),
                open_id_url: None,
            },
        )
    }

    pub fn with_endpoints(
        settings: ProviderSettings,
        http: OauthHttpClient,
        endpoints: ProviderEndpoints,
    ) -> Self {
        Self {
            settings,
            http,
            endpoints,
        }
    }

    fn nested_picture(datas: &Value) -> Option<String> {
        datas
            .get("picture")
            .and_then(|p| p.get("data"))
            .and_then(|d| d.get("url"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

#[async_trait]
impl OauthAdapter for FacebookAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Facebook
    }

    // Facebook 要求 redirect_uri 与注册值精确一致
    fn authorize_url(&self, _next_url: &str) -> String {
        build_url(
            &self.endpoints.auth_url,
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.settings.callback_url.as_str()),
                ("scope", "email,public_profile"),
            ],
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        let body = self
            .http
            .post_form(
                &self.endpoints.token_url,
                &[
                    ("client_id", self.settings.client_id.as_str()),
                    ("client_secret", self.settings.client_secret.as_str()),
                    ("code", code),
                    ("redirect_uri", self.settings.callback_url.as_str()),
                ],
            )
            .await
            .map_err(|e| OauthError::token_exchange(format!("facebook token request: {e}")))?;

        let obj: Value = serde_json::from_str(&body)
            .map_err(|_| OauthError::token_exchange("facebook token response is not JSON"))?;
        let access_token = value_to_string(&obj["access_token"])
            .ok_or_else(|| OauthError::token_exchange("facebook response missing access_token"))?;

        Ok(TokenGrant {
            access_token,
            user_hint: None,
        })
    }

    async fn fetch_profile(&self, grant: &TokenGrant) -> Result<CanonicalProfile> {
        let body = self
            .http
            .get(
                &self.endpoints.api_url,
                &[
                    ("access_token", grant.access_token.as_str()),
                    ("fields", "id,name,picture,email"),
                ],
            )
            .await
            .map_err(|e| OauthError::profile_fetch(format!("facebook profile request: {e}")))?;

        let datas: Value = serde_json::from_str(&body)
            .map_err(|_| OauthError::profile_fetch("facebook profile response is not JSON"))?;
        let external_id = value_to_string(&datas["id"])
            .ok_or_else(|| OauthError::profile_fetch("facebook profile missing id"))?;

        Ok(CanonicalProfile {
            external_id,
            display_name: non_empty_str(&datas, "name").unwrap_or_default(),
            avatar_url: Self::nested_picture(&datas),
            email: non_empty_str(&datas, "email"),
            raw_profile: body,
            access_token: grant.access_token.clone(),
        })
    }

    fn extract_avatar(&self, raw_profile: &str) -> Option<String> {
        let datas: Value = serde_json::from_str(raw_profile).ok()?;
        Self::nested_picture(&datas)
    }

    fn stores_access_token(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_picture_extraction() {
        let raw = r#"{"id":"10","name":"Jo","picture":{"data":{"url":"https://graph.facebook.com/10/picture"}}}"#;
        let adapter = FacebookAdapter::new(
            ProviderSettings {
                client_id: "fb".to_string(),
                client_secret: "s".to_string(),
                callback_url: "https://blog.example.com/oauth/authorize?type=facebook".to_string(),
            },
            OauthHttpClient::new(5, None).unwrap(),
        );
        assert_eq!(
            adapter.extract_avatar(raw).as_deref(),
            Some("https://graph.facebook.com/10/picture")
        );
        assert_eq!(adapter.extract_avatar(r#"{"id":"10"}"#), None);
        assert!(!adapter.stores_access_token());
    }
}
