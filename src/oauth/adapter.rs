//! # 服务商适配器契约
//!
//! 所有服务商实现同一能力集：构造授权地址、换取令牌、拉取资料、
//! 从已存原始资料中重取头像。适配器自身不做任何持久化。

use crate::error::Result;
use crate::oauth::ProviderKind;
use async_trait::async_trait;
use url::Url;

/// 单个服务商的接入参数，来自 `oauth_configs` 配置行
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

/// 服务商各端点地址
///
/// 生产地址由各适配器内置；测试通过 `with_endpoints` 指向本地假服务
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    /// QQ 专用：openid 解析端点
    pub open_id_url: Option<String>,
}

/// 令牌交换结果
///
/// 部分服务商在令牌响应里顺带给出用户标识（微博的 `uid`、
/// Google 的 `id_token`），作为资料拉取的输入
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub user_hint: Option<String>,
}

/// 归一化后的用户资料
#[derive(Debug, Clone)]
pub struct CanonicalProfile {
    /// 用户在服务商侧的唯一标识
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    /// 服务商返回的原始响应体
    pub raw_profile: String,
    pub access_token: String,
}

/// 服务商适配器能力集
#[async_trait]
pub trait OauthAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// 构造授权页地址；纯构造，不发网络请求
    fn authorize_url(&self, next_url: &str) -> String;

    /// 用授权码换取访问令牌
    ///
    /// 响应缺少令牌字段或传输失败时返回 `TokenExchange`，
    /// 不得留下任何部分写入
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant>;

    /// 拉取并归一化用户资料
    async fn fetch_profile(&self, grant: &TokenGrant) -> Result<CanonicalProfile>;

    /// 从已存原始资料中重取头像，不发网络请求
    fn extract_avatar(&self, raw_profile: &str) -> Option<String>;

    /// 令牌是否入库；令牌过长的服务商返回 false
    fn stores_access_token(&self) -> bool {
        true
    }
}

/// 在回调地址上追加回跳路径，形成复合 redirect_uri
///
/// 配置的回调地址已带 `?type=xxx` 查询串，因此直接以 `&` 续接
pub(crate) fn compose_callback(callback_url: &str, next_url: &str) -> String {
    format!("{callback_url}&next_url={next_url}")
}

/// 由端点地址和查询参数拼装授权页 URL
pub(crate) fn build_url(base: &str, params: &[(&str, &str)]) -> String {
    match Url::parse(base) {
        Ok(mut url) => {
            url.query_pairs_mut().extend_pairs(params);
            url.to_string()
        }
        // 端点地址是内置常量，到不了这个分支；测试注入坏地址时原样退回
        Err(_) => base.to_string(),
    }
}
