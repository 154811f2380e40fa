//! # 第三方身份（OAuth2）接入模块
//!
//! 每个服务商一个适配器，统一归一化为 [`CanonicalProfile`]；
//! 适配器只做出站 HTTP，不落库

pub mod adapter;
pub mod adapters;
pub mod http;
pub mod registry;

pub use adapter::{CanonicalProfile, OauthAdapter, ProviderSettings, TokenGrant};
pub use http::OauthHttpClient;
pub use registry::ProviderRegistry;

use std::str::FromStr;

/// 支持的服务商类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Weibo,
    Google,
    Github,
    Facebook,
    Qq,
}

impl ProviderKind {
    pub const ALL: [Self; 5] = [
        Self::Weibo,
        Self::Google,
        Self::Github,
        Self::Facebook,
        Self::Qq,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Weibo => "weibo",
            Self::Google => "google",
            Self::Github => "github",
            Self::Facebook => "facebook",
            Self::Qq => "qq",
        }
    }

    /// 解析类型标识；大小写不敏感，未知标识返回 `None`
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "weibo" => Some(Self::Weibo),
            "google" => Some(Self::Google),
            "github" => Some(Self::Github),
            "facebook" => Some(Self::Facebook),
            "qq" => Some(Self::Qq),
            _ => None,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = crate::error::OauthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::error::OauthError::ConfigMissing(s.to_string()))
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
