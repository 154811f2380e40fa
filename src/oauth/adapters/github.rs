//! # GitHub 适配器
//!
//! 令牌端点返回 form-urlencoded 响应体；资料接口用 token 头认证。
//! 出站请求经共享客户端的可选代理。

use crate::error::{OauthError, Result};
use crate::oauth::adapter::{
    CanonicalProfile, OauthAdapter, ProviderEndpoints, ProviderSettings, TokenGrant, build_url,
    compose_callback,
};
use crate::oauth::adapters::{form_field, non_empty_str, value_to_string};
use crate::oauth::{OauthHttpClient, ProviderKind};
use async_trait::async_trait;
use serde_json::Value;

const AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const API_URL: &str = "https://api.github.com/user";

/// GitHub OAuth2 适配器
pub struct GithubAdapter {
    settings: ProviderSettings,
    http: OauthHttpClient,
    endpoints: ProviderEndpoints,
}

impl GithubAdapter {
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
impl OauthAdapter for GithubAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Github
    }

    fn authorize_url(&self, next_url: &str) -> String {
        let redirect = compose_callback(&self.settings.callback_url, next_url);
        build_url(
            &self.endpoints.auth_url,
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", redirect.as_str()),
                ("scope", "user"),
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
            .map_err(|e| OauthError::token_exchange(format!("github token request: {e}")))?;

        let access_token = form_field(&body, "access_token")
            .ok_or_else(|| OauthError::token_exchange("github response missing access_token"))?;

        Ok(TokenGrant {
            access_token,
            user_hint: None,
        })
    }

    async fn fetch_profile(&self, grant: &TokenGrant) -> Result<CanonicalProfile> {
        let auth_header = format!("token {}", grant.access_token);
        let body = self
            .http
            .get_with_headers(
                &self.endpoints.api_url,
                &[],
                &[("Authorization", auth_header.as_str())],
            )
            .await
            .map_err(|e| OauthError::profile_fetch(format!("github profile request: {e}")))?;

        let datas: Value = serde_json::from_str(&body)
            .map_err(|_| OauthError::profile_fetch("github profile response is not JSON"))?;
        let external_id = value_to_string(&datas["id"])
            .ok_or_else(|| OauthError::profile_fetch("github profile missing id"))?;

        Ok(CanonicalProfile {
            external_id,
            display_name: non_empty_str(&datas, "name")
                .or_else(|| non_empty_str(&datas, "login"))
                .unwrap_or_default(),
            avatar_url: non_empty_str(&datas, "avatar_url"),
            email: non_empty_str(&datas, "email"),
            raw_profile: body,
            access_token: grant.access_token.clone(),
        })
    }

    fn extract_avatar(&self, raw_profile: &str) -> Option<String> {
        let datas: Value = serde_json::from_str(raw_profile).ok()?;
        non_empty_str(&datas, "avatar_url")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_embeds_next_url_in_redirect() {
        let adapter = GithubAdapter::new(
            ProviderSettings {
                client_id: "gh_client".to_string(),
                client_secret: "gh_secret".to_string(),
                callback_url: "https://blog.example.com/oauth/authorize?type=github".to_string(),
            },
            OauthHttpClient::new(5, None).unwrap(),
        );
        let parsed = url::Url::parse(&adapter.authorize_url("/")).unwrap();
        let pairs: std::collections::HashMap<String, String> =
            parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs["scope"], "user");
        assert!(pairs["redirect_uri"].contains("next_url=/"));
    }
}
