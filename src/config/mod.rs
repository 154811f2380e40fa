//! # 配置管理模块

pub mod app_config;

pub use app_config::{AppConfig, DatabaseConfig, OauthHttpConfig, ServerConfig, SiteConfig, SmtpConfig};
