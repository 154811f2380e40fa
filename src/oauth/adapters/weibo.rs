//! # 微博适配器
//!
//! 令牌响应为 JSON，且同时给出 `uid`，资料接口按 uid 查询

use crate::error::{OauthError, Result};
use crate::oauth::adapter::{
    CanonicalProfile, OauthAdapter, ProviderEndpoints, ProviderSettings, TokenGrant, build_url,
    compose_callback,
};
use crate::oauth::adapters::{non_empty_str, value_to_string};
use crate::oauth::{OauthHttpClient, ProviderKind};
use async_trait::async_trait;
use serde_json::Value;

const AUTH_URL: &str = "https://api.weibo.com/oauth2/authorize";
const TOKEN_URL: &str = "https://api.weibo.com/oauth2/access_token";
const API_URL: &str = "https://api.weibo.com/2/users/show.json";

/// 微博 OAuth2 适配器
pub struct WeiboAdapter {
    settings: ProviderSettings,
    http: OauthHttpClient,
    endpoints: ProviderEndpoints,
}

impl WeiboAdapter {
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
impl OauthAdapter for WeiboAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Weibo
    }

    fn authorize_url(&self, next_url: &str) -> String {
        let redirect = compose_callback(&self.settings.callback_url, next_url);
        build_url(
            &self.endpoints.auth_url,
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", redirect.as_str()),
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
            .map_err(|e| OauthError::token_exchange(format!("weibo token request: {e}")))?;

        let obj: Value = serde_json::from_str(&body)
            .map_err(|_| OauthError::token_exchange("weibo token response is not JSON"))?;
        let access_token = value_to_string(&obj["access_token"])
            .ok_or_else(|| OauthError::token_exchange("weibo response missing access_token"))?;
        let uid = value_to_string(&obj["uid"]);

        Ok(TokenGrant {
            access_token,
            user_hint: uid,
        })
    }

    async fn fetch_profile(&self, grant: &TokenGrant) -> Result<CanonicalProfile> {
        let uid = grant
            .user_hint
            .as_deref()
            .ok_or_else(|| OauthError::profile_fetch("weibo grant missing uid"))?;
        let body = self
            .http
            .get(
                &self.endpoints.api_url,
                &[("uid", uid), ("access_token", grant.access_token.as_str())],
            )
            .await
            .map_err(|e| OauthError::profile_fetch(format!("weibo profile request: {e}")))?;

        let datas: Value = serde_json::from_str(&body)
            .map_err(|_| OauthError::profile_fetch("weibo profile response is not JSON"))?;
        let external_id = value_to_string(&datas["id"])
            .ok_or_else(|| OauthError::profile_fetch("weibo profile missing id"))?;
        let display_name = non_empty_str(&datas, "screen_name").unwrap_or_default();

        Ok(CanonicalProfile {
            external_id,
            display_name,
            avatar_url: non_empty_str(&datas, "avatar_large"),
            email: non_empty_str(&datas, "email"),
            raw_profile: body,
            access_token: grant.access_token.clone(),
        })
    }

    fn extract_avatar(&self, raw_profile: &str) -> Option<String> {
        let datas: Value = serde_json::from_str(raw_profile).ok()?;
        non_empty_str(&datas, "avatar_large")
    }
}
