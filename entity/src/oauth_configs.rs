//! # OAuth 配置实体定义
//!
//! 服务商接入配置表的 Sea-ORM 实体模型，管理员维护，读多写少

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 服务商接入配置实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "oauth_configs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 服务商类型标识，全表唯一
    #[sea_orm(unique)]
    pub provider_type: String,
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub enabled: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
