//! # 外部身份实体定义
//!
//! 第三方 OAuth 身份表的 Sea-ORM 实体模型
//! `(provider_type, external_id)` 全表唯一，一个外部身份至多一条记录

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 外部身份实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "linked_identities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 服务商类型标识（weibo / google / github / facebook / qq）
    pub provider_type: String,
    /// 用户在服务商侧的唯一标识
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    /// 服务商访问令牌；对令牌过长的服务商置空
    pub access_token: Option<String>,
    /// 服务商返回的原始资料，仅用于审计与头像重取
    pub raw_profile: Option<String>,
    /// 邮箱，写入时尚未经过确认
    pub email: Option<String>,
    /// 完成绑定后指向本地账户
    pub linked_account_id: Option<i32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::local_accounts::Entity",
        from = "Column::LinkedAccountId",
        to = "super::local_accounts::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    LocalAccount,
}

impl Related<super::local_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LocalAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// 外部身份辅助方法
impl Model {
    /// 是否已完成绑定
    pub fn is_linked(&self) -> bool {
        self.linked_account_id.is_some()
    }

    /// 是否留有邮箱（不代表已确认）
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.is_empty())
    }
}
