//! # 应用配置结构定义
//!
//! TOML 配置文件 + 环境变量覆盖，反序列化为 `AppConfig`

use crate::error::{OauthError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// 应用主配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 站点配置
    pub site: SiteConfig,
    /// 出站 OAuth 调用配置
    #[serde(default)]
    pub oauth: OauthHttpConfig,
    /// SMTP 配置；缺省时邮件仅记录日志
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp: Option<SmtpConfig>,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 连接URL，可被 DATABASE_URL 环境变量覆盖
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/blog.db".to_string(),
            max_connections: 10,
        }
    }
}

/// 站点配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// 本站域名，用于回跳地址校验与确认链接拼装
    pub domain: String,
    /// 链接协议
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// 签名与会话共用的密钥
    pub secret_key: String,
}

fn default_scheme() -> String {
    "http".to_string()
}

/// 出站 OAuth 调用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthHttpConfig {
    /// 单次出站请求超时（秒）
    pub http_timeout_secs: u64,
    /// 正向代理地址；缺省时读取 HTTP_PROXY 环境变量
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// 启用服务商快照的缓存时长（秒）
    pub provider_cache_ttl_secs: u64,
}

impl Default for OauthHttpConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: 30,
            proxy_url: None,
            // 沿用来源实现的 100 分钟
            provider_cache_ttl_secs: 100 * 60,
        }
    }
}

impl OauthHttpConfig {
    /// 解析实际生效的代理地址
    pub fn effective_proxy(&self) -> Option<String> {
        self.proxy_url
            .clone()
            .or_else(|| env::var("HTTP_PROXY").ok())
            .filter(|p| !p.is_empty())
    }
}

/// SMTP 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
    pub from_name: String,
}

impl AppConfig {
    /// 从 TOML 文件加载配置并应用环境变量覆盖
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| OauthError::Config(format!("读取配置文件失败 {}: {e}", path.display())))?;
        let mut config: Self = toml::from_str(&raw)
            .map_err(|e| OauthError::Config(format!("解析配置文件失败: {e}")))?;

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database.url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(OauthError::Config("database.url 不能为空".to_string()));
        }
        if self.site.domain.is_empty() {
            return Err(OauthError::Config("site.domain 不能为空".to_string()));
        }
        if self.site.secret_key.len() < 16 {
            return Err(OauthError::Config(
                "site.secret_key 长度至少 16 字符".to_string(),
            ));
        }
        Ok(())
    }

    /// 服务监听地址
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 站点根地址，例如 `http://blog.example.com`
    pub fn site_base(&self) -> String {
        format!("{}://{}", self.site.scheme, self.site.domain)
    }
}
