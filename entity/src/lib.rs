//! # Entity 模块
//!
//! 包含所有 Sea-ORM 实体定义

pub mod linked_identities;
pub mod local_accounts;
pub mod oauth_configs;

pub use linked_identities::Entity as LinkedIdentities;
pub use local_accounts::Entity as LocalAccounts;
pub use oauth_configs::Entity as OauthConfigs;
