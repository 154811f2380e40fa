//! # 账户绑定状态机
//!
//! 给定一份归一化资料，决定登录、建号还是等待邮箱确认。
//! 身份与账户的"读取-解析-写回"在单个事务内完成；并发的重复回调
//! 在事务内观察到已提交的绑定后直接短路，绝不产生第二个账户。

pub mod signing;
pub mod username;

pub use signing::LinkSigner;

use crate::error::{OauthError, Result};
use crate::mail::{MailSender, confirmation_mail_body, link_complete_mail_body};
use crate::oauth::{CanonicalProfile, OauthAdapter};
use entity::{LinkedIdentities, LocalAccounts, linked_identities, local_accounts};
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, TransactionTrait,
};
use std::sync::{Arc, LazyLock};
use username::{fallback_display_name, unique_username};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

/// 身份的绑定状态，由存储字段推导
///
/// `UNLINKED_WITH_EMAIL` 是瞬态：带邮箱的回调在同一事务内直接落到
/// `Linked`，静止状态里观察不到
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    UnlinkedNoEmail,
    PendingEmailConfirmation,
    Linked,
}

/// 推导身份当前所处状态
#[must_use]
pub fn link_state(identity: &linked_identities::Model) -> LinkState {
    if identity.is_linked() {
        LinkState::Linked
    } else if identity.has_email() {
        LinkState::PendingEmailConfirmation
    } else {
        LinkState::UnlinkedNoEmail
    }
}

/// 回调处理结果
#[derive(Debug)]
pub enum LinkOutcome {
    /// 已绑定并登录
    LoggedIn {
        account: local_accounts::Model,
        identity_id: i32,
    },
    /// 服务商未给出邮箱，进入邮箱补充步骤
    PendingEmail { identity_id: i32 },
}

/// 账户绑定器
#[derive(Clone)]
pub struct AccountLinker {
    db: DatabaseConnection,
    signer: LinkSigner,
    mailer: Arc<dyn MailSender>,
    site_base: String,
}

impl AccountLinker {
    pub fn new(
        db: DatabaseConnection,
        signer: LinkSigner,
        mailer: Arc<dyn MailSender>,
        site_base: String,
    ) -> Self {
        Self {
            db,
            signer,
            mailer,
            site_base,
        }
    }

    /// 处理一次成功取回资料的回调
    ///
    /// 已绑定身份重复回调时仅刷新缓存字段并复用既有账户（可任意重复）；
    /// 带邮箱的未绑定身份在单个事务里完成建号与绑定
    pub async fn handle_callback(
        &self,
        adapter: &dyn OauthAdapter,
        mut profile: CanonicalProfile,
    ) -> Result<LinkOutcome> {
        let now = chrono::Utc::now().naive_utc();
        if profile.display_name.trim().is_empty() {
            profile.display_name = fallback_display_name(now);
        }

        let identity = self
            .upsert_identity(adapter.kind().as_str(), &profile, adapter.stores_access_token(), now)
            .await?;

        if identity.is_linked() || identity.has_email() {
            let (account, identity) = self.link_in_transaction(identity.id, "authorize").await?;
            Ok(LinkOutcome::LoggedIn {
                account,
                identity_id: identity.id,
            })
        } else {
            Ok(LinkOutcome::PendingEmail {
                identity_id: identity.id,
            })
        }
    }

    /// 邮箱补充提交：校验、暂存（未确认）、签发确认链接并寄出
    pub async fn submit_email(&self, identity_id: i32, email: &str) -> Result<()> {
        let email = email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(OauthError::validation("邮箱格式不正确"));
        }

        let identity = self.load_identity(identity_id).await?;
        let now = chrono::Utc::now().naive_utc();
        let mut active: linked_identities::ActiveModel = identity.into();
        active.email = Set(Some(email.to_string()));
        active.updated_at = Set(now);
        active.update(&self.db).await?;

        let signature = self.signer.sign(identity_id);
        let confirm_url = format!(
            "{}/oauth/emailconfirm/{}/{}.html",
            self.site_base, identity_id, signature
        );
        self.mailer
            .send(email, "Bind your email", &confirmation_mail_body(&confirm_url))
            .await?;
        Ok(())
    }

    /// 确认链接回访：验签通过后在事务内完成绑定并登录
    ///
    /// 验签失败立即拒绝，不触碰任何状态，也不区分"身份不存在"
    pub async fn confirm_email(
        &self,
        identity_id: i32,
        signature: &str,
    ) -> Result<(local_accounts::Model, linked_identities::Model)> {
        if !self.signer.verify(identity_id, signature) {
            return Err(OauthError::InvalidSignature);
        }

        let (account, identity) = self.link_in_transaction(identity_id, "emailconfirm").await?;

        // 绑定已提交，通知邮件失败只记日志
        if let Some(email) = identity.email.as_deref().filter(|e| !e.is_empty()) {
            let body = link_complete_mail_body(&identity.provider_type, &self.site_base);
            if let Err(e) = self
                .mailer
                .send(email, "Congratulations on your successful binding!", &body)
                .await
            {
                tracing::warn!(identity_id, error = %e, "绑定完成通知发送失败");
            }
        }

        Ok((account, identity))
    }

    /// 读取身份记录，供补邮箱/落地页展示
    pub async fn load_identity(&self, identity_id: i32) -> Result<linked_identities::Model> {
        LinkedIdentities::find_by_id(identity_id)
            .one(&self.db)
            .await?
            .ok_or(OauthError::IdentityNotFound(identity_id))
    }

    /// 确认链接签名器
    #[must_use]
    pub fn signer(&self) -> &LinkSigner {
        &self.signer
    }

    /// 按 `(provider_type, external_id)` 幂等写入身份
    ///
    /// 已有记录时刷新展示字段；既存邮箱从不被覆盖清空。
    /// 并发首登撞唯一索引时回读既有行。
    async fn upsert_identity(
        &self,
        provider_type: &str,
        profile: &CanonicalProfile,
        store_token: bool,
        now: chrono::NaiveDateTime,
    ) -> Result<linked_identities::Model> {
        let token_value = store_token.then(|| profile.access_token.clone());

        if let Some(existing) = self.find_identity(provider_type, &profile.external_id).await? {
            return self.refresh_identity(existing, profile, token_value, now).await;
        }

        let fresh = linked_identities::ActiveModel {
            provider_type: Set(provider_type.to_string()),
            external_id: Set(profile.external_id.clone()),
            display_name: Set(profile.display_name.clone()),
            avatar_url: Set(profile.avatar_url.clone()),
            access_token: Set(token_value.clone()),
            raw_profile: Set(Some(profile.raw_profile.clone())),
            email: Set(profile.email.clone()),
            linked_account_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match fresh.insert(&self.db).await {
            Ok(model) => Ok(model),
            Err(insert_err) => {
                // 并发首登：另一请求刚插入同一外部身份
                match self.find_identity(provider_type, &profile.external_id).await? {
                    Some(existing) => {
                        self.refresh_identity(existing, profile, token_value, now).await
                    }
                    None => Err(insert_err.into()),
                }
            }
        }
    }

    async fn find_identity(
        &self,
        provider_type: &str,
        external_id: &str,
    ) -> Result<Option<linked_identities::Model>> {
        Ok(LinkedIdentities::find()
            .filter(linked_identities::Column::ProviderType.eq(provider_type))
            .filter(linked_identities::Column::ExternalId.eq(external_id))
            .one(&self.db)
            .await?)
    }

    async fn refresh_identity(
        &self,
        existing: linked_identities::Model,
        profile: &CanonicalProfile,
        token_value: Option<String>,
        now: chrono::NaiveDateTime,
    ) -> Result<linked_identities::Model> {
        let keep_email = existing.has_email();
        let mut active: linked_identities::ActiveModel = existing.into();
        active.display_name = Set(profile.display_name.clone());
        active.avatar_url = Set(profile.avatar_url.clone());
        active.access_token = Set(token_value);
        active.raw_profile = Set(Some(profile.raw_profile.clone()));
        if !keep_email && profile.email.is_some() {
            active.email = Set(profile.email.clone());
        }
        active.updated_at = Set(now);
        Ok(active.update(&self.db).await?)
    }

    /// 绑定事务入口；`TransactionError` 统一折叠回 [`OauthError`]
    async fn link_in_transaction(
        &self,
        identity_id: i32,
        source: &str,
    ) -> Result<(local_accounts::Model, linked_identities::Model)> {
        let source = source.to_string();
        self.db
            .transaction::<_, (local_accounts::Model, linked_identities::Model), OauthError>(
                move |txn| Box::pin(async move { link_identity_tx(txn, identity_id, &source).await }),
            )
            .await
            .map_err(OauthError::from)
    }
}

/// 事务内的绑定核心：重读身份、按邮箱取或建账户、写回绑定
///
/// 并发的第二个事务在这里观察到已提交的 `linked_account_id` 并短路，
/// 这是防止重复建号的串行化点
async fn link_identity_tx(
    txn: &DatabaseTransaction,
    identity_id: i32,
    source: &str,
) -> Result<(local_accounts::Model, linked_identities::Model)> {
    let identity = LinkedIdentities::find_by_id(identity_id)
        .one(txn)
        .await?
        .ok_or(OauthError::IdentityNotFound(identity_id))?;

    if let Some(account_id) = identity.linked_account_id {
        if let Some(account) = LocalAccounts::find_by_id(account_id).one(txn).await? {
            return Ok((account, identity));
        }
    }

    let email = identity
        .email
        .clone()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| OauthError::validation("身份缺少邮箱，无法绑定"))?;

    let now = chrono::Utc::now().naive_utc();
    let account = match LocalAccounts::find()
        .filter(local_accounts::Column::Email.eq(&email))
        .one(txn)
        .await?
    {
        Some(account) => account,
        None => {
            let username = unique_username(txn, &identity.display_name, now).await?;
            local_accounts::ActiveModel {
                username: Set(username),
                email: Set(Some(email)),
                source: Set(source.to_string()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?
        }
    };

    let mut active: linked_identities::ActiveModel = identity.into();
    active.linked_account_id = Set(Some(account.id));
    active.updated_at = Set(now);
    let identity = active.update(txn).await?;

    Ok((account, identity))
}
