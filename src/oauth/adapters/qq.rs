//! # QQ 适配器
//!
//! 三次往返：GET 换令牌（form-urlencoded 响应），再访问 `oauth2.0/me`
//! 解析 openid（JSONP 包裹），最后才能拉取用户资料

use crate::error::{OauthError, Result};
use crate::oauth::adapter::{
    CanonicalProfile, OauthAdapter, ProviderEndpoints, ProviderSettings, TokenGrant, build_url,
    compose_callback,
};
use crate::oauth::adapters::{form_field, non_empty_str, value_to_string};
use crate::oauth::{OauthHttpClient, ProviderKind};
use async_trait::async_trait;
use serde_json::Value;

const AUTH_URL: &str = "https://graph.qq.com/oauth2.0/authorize";
const TOKEN_URL: &str = "https://graph.qq.com/oauth2.0/token";
const API_URL: &str = "https://graph.qq.com/user/get_user_info";
const OPEN_ID_URL: &str = "https://graph.qq.com/oauth2.0/me";

/// QQ OAuth2 适配器
pub struct QqAdapter {
    settings: ProviderSettings,
    http: OauthHttpClient,
    endpoints: ProviderEndpoints,
}

impl QqAdapter {
    pub fn new(settings: ProviderSettings, http: OauthHttpClient) -> Self {
        Self::with_endpoints(
            settings,
            http,
            ProviderEndpoints {
                auth_url: AUTH_URL.to_string(),
                token_url: TOKEN_URL.to_string(),
                api_url: API_URL.to_string(),
                open_id_url: Some(OPEN_ID_URL.to_string()),
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

    /// 解析 openid；`oauth2.0/me` 的响应是 JSONP 包裹的 JSON
    async fn resolve_open_id(&self, access_token: &str) -> Result<String> {
        let open_id_url = self
            .endpoints
            .open_id_url
            .as_deref()
            .ok_or_else(|| OauthError::profile_fetch("qq open_id endpoint not set"))?;
        let body = self
            .http
            .get(open_id_url, &[("access_token", access_token)])
            .await
            .map_err(|e| OauthError::profile_fetch(format!("qq openid request: {e}")))?;

        let obj: Value = serde_json::from_str(strip_jsonp(&body))
            .map_err(|_| OauthError::profile_fetch("qq openid response is not JSONP/JSON"))?;
        value_to_string(&obj["openid"])
            .ok_or_else(|| OauthError::profile_fetch("qq openid response missing openid"))
    }
}

/// 去掉 JSONP 回调包裹，返回其中的 JSON 文本
///
/// `callback( {...} );` -> `{...}`；没有包裹时原样返回
pub(crate) fn strip_jsonp(body: &str) -> &str {
    match (body.find('('), body.rfind(')')) {
        (Some(start), Some(end)) if start < end => body[start + 1..end].trim(),
        _ => body.trim(),
    }
}

#[async_trait]
impl OauthAdapter for QqAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Qq
    }

    fn authorize_url(&self, next_url: &str) -> String {
        let redirect = compose_callback(&self.settings.callback_url, next_url);
        build_url(
            &self.endpoints.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", redirect.as_str()),
            ],
        )
    }

    // QQ 的令牌端点走 GET，响应是 form-urlencoded
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant> {
        let body = self
            .http
            .get(
                &self.endpoints.token_url,
                &[
                    ("grant_type", "authorization_code"),
                    ("client_id", self.settings.client_id.as_str()),
                    ("client_secret", self.settings.client_secret.as_str()),
                    ("code", code),
                    ("redirect_uri", self.settings.callback_url.as_str()),
                ],
            )
            .await
            .map_err(|e| OauthError::token_exchange(format!("qq token request: {e}")))?;

        let access_token = form_field(&body, "access_token")
            .ok_or_else(|| OauthError::token_exchange("qq response missing access_token"))?;

        Ok(TokenGrant {
            access_token,
            user_hint: None,
        })
    }

    async fn fetch_profile(&self, grant: &TokenGrant) -> Result<CanonicalProfile> {
        let openid = self.resolve_open_id(&grant.access_token).await?;
        let body = self
            .http
            .get(
                &self.endpoints.api_url,
                &[
                    ("access_token", grant.access_token.as_str()),
                    ("oauth_consumer_key", self.settings.client_id.as_str()),
                    ("openid", openid.as_str()),
                ],
            )
            .await
            .map_err(|e| OauthError::profile_fetch(format!("qq profile request: {e}")))?;

        let obj: Value = serde_json::from_str(&body)
            .map_err(|_| OauthError::profile_fetch("qq profile response is not JSON"))?;

        Ok(CanonicalProfile {
            external_id: openid,
            display_name: non_empty_str(&obj, "nickname").unwrap_or_default(),
            avatar_url: non_empty_str(&obj, "figureurl"),
            email: non_empty_str(&obj, "email"),
            raw_profile: body,
            access_token: grant.access_token.clone(),
        })
    }

    fn extract_avatar(&self, raw_profile: &str) -> Option<String> {
        let datas: Value = serde_json::from_str(raw_profile).ok()?;
        non_empty_str(&datas, "figureurl")
    }
}
