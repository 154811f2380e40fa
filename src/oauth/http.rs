//! # 出站 HTTP 客户端
//!
//! 适配器共用的令牌交换/资料拉取客户端：统一超时，可选正向代理。
//! 代理是传输层关注点，对适配器契约透明。

use crate::error::Result;
use std::time::Duration;

/// OAuth 出站调用客户端
#[derive(Debug, Clone)]
pub struct OauthHttpClient {
    client: reqwest::Client,
}

impl OauthHttpClient {
    /// 创建客户端；`proxy_url` 存在时所有出站请求走该代理
    pub fn new(timeout_secs: u64, proxy_url: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("blog-oauth/0.1");

        if let Some(proxy) = proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// GET 请求，返回响应体文本
    pub async fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<String> {
        self.get_with_headers(url, params, &[]).await
    }

    /// 带自定义请求头的 GET 请求
    pub async fn get_with_headers(
        &self,
        url: &str,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<String> {
        let mut request = self.client.get(url).query(params);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let body = request.send().await?.text().await?;
        tracing::debug!(url, body, "oauth GET");
        Ok(body)
    }

    /// POST 表单请求，返回响应体文本
    pub async fn post_form(&self, url: &str, params: &[(&str, &str)]) -> Result<String> {
        let body = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .form(params)
            .send()
            .await?
            .text()
            .await?;
        tracing::debug!(url, body, "oauth POST");
        Ok(body)
    }
}
