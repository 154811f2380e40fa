//! # 服务装配与启动

use crate::config::AppConfig;
use crate::error::Result;
use crate::linker::{AccountLinker, LinkSigner};
use crate::mail::{LogMailer, MailSender, SmtpMailer};
use crate::oauth::{OauthHttpClient, ProviderRegistry};
use crate::web::routes::create_routes;
use crate::web::session::SessionIssuer;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: ProviderRegistry,
    pub linker: AccountLinker,
    pub sessions: SessionIssuer,
}

/// 由配置与数据库连接装配出完整状态
pub fn build_state(config: AppConfig, db: DatabaseConnection) -> Result<AppState> {
    let http = OauthHttpClient::new(
        config.oauth.http_timeout_secs,
        config.oauth.effective_proxy().as_deref(),
    )?;
    let registry = ProviderRegistry::new(
        db.clone(),
        http,
        Duration::from_secs(config.oauth.provider_cache_ttl_secs),
    );

    let mailer: Arc<dyn MailSender> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        None => Arc::new(LogMailer),
    };

    let signer = LinkSigner::new(config.site.secret_key.clone());
    let linker = AccountLinker::new(db, signer, mailer, config.site_base());
    let sessions = SessionIssuer::new(&config.site.secret_key);

    Ok(AppState {
        config: Arc::new(config),
        registry,
        linker,
        sessions,
    })
}

/// 启动 HTTP 服务
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.config.listen_addr();
    let router = create_routes(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| crate::error::OauthError::Config(format!("监听 {addr} 失败: {e}")))?;
    tracing::info!(addr, "OAuth 登录服务启动");
    axum::serve(listener, router)
        .await
        .map_err(|e| crate::error::OauthError::Config(format!("服务运行失败: {e}")))?;
    Ok(())
}
