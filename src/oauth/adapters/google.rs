//! # Google 适配器
//!
//! 标准 JSON 令牌响应；userinfo 端点按 access_token 查询。
//! 出站请求经共享客户端的可选代理。

use crate::error::{OauthError, Result};
use crate::oauth::adapter::{
    CanonicalProfile, OauthAdapter, ProviderEndpoints, ProviderSettings, TokenGrant, build_url,
};
use crate::oauth::adapters::{non_empty_str, value_to_string};
use crate::oauth::{OauthHttpClient, ProviderKind};
use async_trait::async_trait;
use serde_json::Value;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v4/token";
const API_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Google OAuth2 适配器
pub struct GoogleAdapter {
    settings: ProviderSettings,
    http: OauthHttpClient,
    endpoints: ProviderEndpoints,
}

impl GoogleAdapter {
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
}

#[async_trait]
impl OauthAdapter for GoogleAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    // Google 要求 redirect_uri 与注册值精确一致，回跳路径不参与拼接
    fn authorize_url(&self, _next_url: &str) -> String {
        build_url(
            &self.endpoints.auth_url,
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.settings.callback_url.as_str()),
                ("scope", "openid email"),
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
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", self.settings.callback_url.as_str()),
                ],
            )
            .await
            .map_err(|e| OauthError::token_exchange(format!("google token request: {e}")))?;

        let obj: Value = serde_json::from_str(&body)
            .map_err(|_| OauthError::token_exchange("google token response is not JSON"))?;
        let access_token = value_to_string(&obj["access_token"])
            .ok_or_else(|| OauthError::token_exchange("google response missing access_token"))?;

        Ok(TokenGrant {
            access_token,
            user_hint: value_to_string(&obj["id_token"]),
        })
    }

    async fn fetch_profile(&self, grant: &TokenGrant) -> Result<CanonicalProfile> {
        let body = self
            .http
            .get(
                &self.endpoints.api_url,
                &[("access_token", grant.access_token.as_str())],
            )
            .await
            .map_err(|e| OauthError::profile_fetch(format!("google profile request: {e}")))?;

        let datas: Value = serde_json::from_str(&body)
            .map_err(|_| OauthError::profile_fetch("google profile response is not JSON"))?;
        let external_id = non_empty_str(&datas, "sub")
            .ok_or_else(|| OauthError::profile_fetch("google profile missing sub"))?;

        Ok(CanonicalProfile {
            external_id,
            display_name: non_empty_str(&datas, "name").unwrap_or_default(),
            avatar_url: non_empty_str(&datas, "picture"),
            email: non_empty_str(&datas, "email"),
            raw_profile: body,
            access_token: grant.access_token.clone(),
        })
    }

    fn extract_avatar(&self, raw_profile: &str) -> Option<String> {
        let datas: Value = serde_json::from_str(raw_profile).ok()?;
        non_empty_str(&datas, "picture")
    }
}
