//! # 服务商注册表
//!
//! 从 `oauth_configs` 加载启用的服务商并实例化适配器。
//! 构造表是显式静态映射；启用快照按 TTL 缓存，配置变更在
//! 缓存过期后才可见（与来源实现一致的取舍）。

use crate::error::Result;
use crate::oauth::adapter::{OauthAdapter, ProviderSettings};
use crate::oauth::adapters::{
    FacebookAdapter, GithubAdapter, GoogleAdapter, QqAdapter, WeiboAdapter,
};
use crate::oauth::{OauthHttpClient, ProviderKind};
use entity::{OauthConfigs, oauth_configs};
use moka::future::Cache;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use std::time::Duration;

/// 服务商类型到适配器构造函数的静态映射
fn build_adapter(
    kind: ProviderKind,
    settings: ProviderSettings,
    http: OauthHttpClient,
) -> Arc<dyn OauthAdapter> {
    match kind {
        ProviderKind::Weibo => Arc::new(WeiboAdapter::new(settings, http)),
        ProviderKind::Google => Arc::new(GoogleAdapter::new(settings, http)),
        ProviderKind::Github => Arc::new(GithubAdapter::new(settings, http)),
        ProviderKind::Facebook => Arc::new(FacebookAdapter::new(settings, http)),
        ProviderKind::Qq => Arc::new(QqAdapter::new(settings, http)),
    }
}

type AdapterSnapshot = Arc<Vec<Arc<dyn OauthAdapter>>>;

/// 服务商注册表
#[derive(Clone)]
pub struct ProviderRegistry {
    db: DatabaseConnection,
    http: OauthHttpClient,
    cache: Cache<(), AdapterSnapshot>,
}

impl ProviderRegistry {
    pub fn new(db: DatabaseConnection, http: OauthHttpClient, cache_ttl: Duration) -> Self {
        Self {
            db,
            http,
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(cache_ttl)
                .build(),
        }
    }

    /// 返回启用的适配器快照；没有任何启用配置时为空集
    ///
    /// 空集表示"功能不可用"，调用方不应视为错误
    pub async fn list_enabled(&self) -> Result<AdapterSnapshot> {
        if let Some(snapshot) = self.cache.get(&()).await {
            return Ok(snapshot);
        }

        let snapshot = self.load_enabled().await?;
        self.cache.insert((), snapshot.clone()).await;
        Ok(snapshot)
    }

    /// 按类型取适配器；未启用或未配置时返回 `None`
    pub async fn get(&self, kind: ProviderKind) -> Result<Option<Arc<dyn OauthAdapter>>> {
        let snapshot = self.list_enabled().await?;
        Ok(snapshot.iter().find(|a| a.kind() == kind).cloned())
    }

    /// 立即丢弃缓存快照，下次访问重新读配置
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }

    async fn load_enabled(&self) -> Result<AdapterSnapshot> {
        let rows = OauthConfigs::find()
            .filter(oauth_configs::Column::Enabled.eq(true))
            .all(&self.db)
            .await?;

        let mut adapters: Vec<Arc<dyn OauthAdapter>> = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(kind) = ProviderKind::parse(&row.provider_type) else {
                tracing::warn!(provider_type = %row.provider_type, "忽略未知的服务商配置");
                continue;
            };
            let settings = ProviderSettings {
                client_id: row.client_id,
                client_secret: row.client_secret,
                callback_url: row.callback_url,
            };
            adapters.push(build_adapter(kind, settings, self.http.clone()));
        }

        Ok(Arc::new(adapters))
    }
}
