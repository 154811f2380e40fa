//! # 本地账户实体定义
//!
//! 站点自有用户表的 Sea-ORM 实体模型

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 本地账户实体
///
/// `email` 为空表示账户尚未留下邮箱；非空时全表唯一
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "local_accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: Option<String>,
    /// 账户来源：register / authorize / emailconfirm
    pub source: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::linked_identities::Entity")]
    LinkedIdentities,
}

impl Related<super::linked_identities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LinkedIdentities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
