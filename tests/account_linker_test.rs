//! 账户绑定状态机集成测试
//!
//! 内存库上验证：带邮箱回调一步绑定、缺邮箱走补充+确认流程、
//! 签名篡改零状态变更、重复回调幂等、撞名自动让位

use async_trait::async_trait;
use blog_oauth::error::{OauthError, Result as OauthResult};
use pretty_assertions::assert_eq;
use blog_oauth::linker::{AccountLinker, LinkOutcome, LinkSigner, LinkState, link_state};
use blog_oauth::mail::MailSender;
use blog_oauth::oauth::{CanonicalProfile, OauthAdapter, ProviderKind, TokenGrant};
use entity::{LinkedIdentities, LocalAccounts, local_accounts};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait};
use std::sync::{Arc, Mutex};

const SECRET: &str = "0123456789abcdef0123456789abcdef";

/// 记录发出的每封邮件，供断言
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> OauthResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html_body.to_string()));
        Ok(())
    }
}

/// 绑定器只用到 kind 与 stores_access_token，网络能力不会被调用
struct StubAdapter {
    kind: ProviderKind,
    store_token: bool,
}

#[async_trait]
impl OauthAdapter for StubAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn authorize_url(&self, _next_url: &str) -> String {
        "https://provider.example.com/authorize".to_string()
    }

    async fn exchange_code(&self, _code: &str) -> OauthResult<TokenGrant> {
        Err(OauthError::token_exchange("stub adapter"))
    }

    async fn fetch_profile(&self, _grant: &TokenGrant) -> OauthResult<CanonicalProfile> {
        Err(OauthError::profile_fetch("stub adapter"))
    }

    fn extract_avatar(&self, _raw_profile: &str) -> Option<String> {
        None
    }

    fn stores_access_token(&self) -> bool {
        self.store_token
    }
}

fn github_stub() -> StubAdapter {
    StubAdapter {
        kind: ProviderKind::Github,
        store_token: true,
    }
}

fn profile(external_id: &str, display_name: &str, email: Option<&str>) -> CanonicalProfile {
    CanonicalProfile {
        external_id: external_id.to_string(),
        display_name: display_name.to_string(),
        avatar_url: Some("https://avatars.example.com/1.png".to_string()),
        email: email.map(str::to_string),
        raw_profile: r#"{"id":1}"#.to_string(),
        access_token: "tok".to_string(),
    }
}

async fn setup() -> (AccountLinker, DatabaseConnection, Arc<RecordingMailer>) {
    let db = blog_oauth::database::init_database("sqlite::memory:", 1)
        .await
        .unwrap();
    blog_oauth::database::run_migrations(&db).await.unwrap();
    let mailer = Arc::new(RecordingMailer::default());
    let linker = AccountLinker::new(
        db.clone(),
        LinkSigner::new(SECRET),
        mailer.clone(),
        "http://blog.example.com".to_string(),
    );
    (linker, db, mailer)
}

async fn identity_count(db: &DatabaseConnection) -> usize {
    LinkedIdentities::find().all(db).await.unwrap().len()
}

async fn account_count(db: &DatabaseConnection) -> usize {
    LocalAccounts::find().all(db).await.unwrap().len()
}

#[tokio::test]
async fn callback_with_email_links_and_logs_in() {
    let (linker, db, _mailer) = setup().await;

    let outcome = linker
        .handle_callback(&github_stub(), profile("583231", "octocat", Some("a@x.com")))
        .await
        .unwrap();

    let LinkOutcome::LoggedIn { account, identity_id } = outcome else {
        panic!("expected LoggedIn");
    };
    assert_eq!(account.email.as_deref(), Some("a@x.com"));
    assert_eq!(account.username, "octocat");
    assert_eq!(account.source, "authorize");

    assert_eq!(identity_count(&db).await, 1);
    assert_eq!(account_count(&db).await, 1);

    let identity = LinkedIdentities::find_by_id(identity_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(identity.linked_account_id, Some(account.id));
    assert_eq!(link_state(&identity), LinkState::Linked);
}

#[tokio::test]
async fn callback_without_email_defers_to_email_step() {
    let (linker, db, _mailer) = setup().await;

    let outcome = linker
        .handle_callback(&github_stub(), profile("583231", "octocat", None))
        .await
        .unwrap();

    let LinkOutcome::PendingEmail { identity_id } = outcome else {
        panic!("expected PendingEmail");
    };
    assert_eq!(account_count(&db).await, 0);

    let identity = LinkedIdentities::find_by_id(identity_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(link_state(&identity), LinkState::UnlinkedNoEmail);

    // 重复无邮箱回调仍然停在补充步骤，不会凭空绑定
    let outcome = linker
        .handle_callback(&github_stub(), profile("583231", "octocat", None))
        .await
        .unwrap();
    assert!(matches!(outcome, LinkOutcome::PendingEmail { .. }));
    assert_eq!(identity_count(&db).await, 1);
    assert_eq!(account_count(&db).await, 0);
}

#[tokio::test]
async fn email_submission_then_confirmation_completes_link() {
    let (linker, db, mailer) = setup().await;

    let LinkOutcome::PendingEmail { identity_id } = linker
        .handle_callback(&github_stub(), profile("583231", "octocat", None))
        .await
        .unwrap()
    else {
        panic!("expected PendingEmail");
    };

    linker.submit_email(identity_id, "b@y.com").await.unwrap();

    let identity = LinkedIdentities::find_by_id(identity_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(link_state(&identity), LinkState::PendingEmailConfirmation);

    // 确认邮件寄到了提交的地址，正文带签名链接
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let signature = LinkSigner::new(SECRET).sign(identity_id);
    assert_eq!(sent[0].0, "b@y.com");
    assert!(sent[0].2.contains(&format!(
        "/oauth/emailconfirm/{identity_id}/{signature}.html"
    )));

    // 签名大小写不敏感
    let (account, identity) = linker
        .confirm_email(identity_id, &signature.to_ascii_lowercase())
        .await
        .unwrap();
    assert_eq!(account.email.as_deref(), Some("b@y.com"));
    assert_eq!(account.source, "emailconfirm");
    assert_eq!(identity.linked_account_id, Some(account.id));
    assert_eq!(account_count(&db).await, 1);

    // 绑定完成通知
    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].0, "b@y.com");

    // 链接可重复访问（无单次失效），仍解析到同一账户
    let (again, _) = linker.confirm_email(identity_id, &signature).await.unwrap();
    assert_eq!(again.id, account.id);
    assert_eq!(account_count(&db).await, 1);
}

#[tokio::test]
async fn tampered_signature_is_rejected_without_state_change() {
    let (linker, db, _mailer) = setup().await;

    let LinkOutcome::PendingEmail { identity_id } = linker
        .handle_callback(&github_stub(), profile("583231", "octocat", None))
        .await
        .unwrap()
    else {
        panic!("expected PendingEmail");
    };
    linker.submit_email(identity_id, "b@y.com").await.unwrap();

    let mut tampered = LinkSigner::new(SECRET).sign(identity_id).into_bytes();
    tampered[0] = if tampered[0] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let err = linker.confirm_email(identity_id, &tampered).await.unwrap_err();
    assert!(matches!(err, OauthError::InvalidSignature));

    // 零状态变更：没有账户，身份仍在等待确认
    assert_eq!(account_count(&db).await, 0);
    let identity = LinkedIdentities::find_by_id(identity_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(link_state(&identity), LinkState::PendingEmailConfirmation);
    assert_eq!(identity.linked_account_id, None);
}

#[tokio::test]
async fn invalid_email_submission_is_a_validation_error() {
    let (linker, _db, mailer) = setup().await;

    let LinkOutcome::PendingEmail { identity_id } = linker
        .handle_callback(&github_stub(), profile("583231", "octocat", None))
        .await
        .unwrap()
    else {
        panic!("expected PendingEmail");
    };

    let err = linker.submit_email(identity_id, "not-an-email").await.unwrap_err();
    assert!(matches!(err, OauthError::Validation(_)));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn repeated_callback_reuses_linked_account_and_refreshes_profile() {
    let (linker, db, _mailer) = setup().await;

    let LinkOutcome::LoggedIn { account: first, .. } = linker
        .handle_callback(&github_stub(), profile("583231", "octocat", Some("a@x.com")))
        .await
        .unwrap()
    else {
        panic!("expected LoggedIn");
    };

    // 同一身份换了昵称再次回调
    let LinkOutcome::LoggedIn { account: second, identity_id } = linker
        .handle_callback(&github_stub(), profile("583231", "the-octocat", Some("a@x.com")))
        .await
        .unwrap()
    else {
        panic!("expected LoggedIn");
    };

    assert_eq!(first.id, second.id);
    assert_eq!(identity_count(&db).await, 1);
    assert_eq!(account_count(&db).await, 1);

    let identity = LinkedIdentities::find_by_id(identity_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(identity.display_name, "the-octocat");
}

#[tokio::test]
async fn same_email_from_two_providers_shares_one_account() {
    let (linker, db, _mailer) = setup().await;

    let LinkOutcome::LoggedIn { account: first, .. } = linker
        .handle_callback(&github_stub(), profile("583231", "octocat", Some("a@x.com")))
        .await
        .unwrap()
    else {
        panic!("expected LoggedIn");
    };

    let weibo = StubAdapter {
        kind: ProviderKind::Weibo,
        store_token: true,
    };
    let LinkOutcome::LoggedIn { account: second, .. } = linker
        .handle_callback(&weibo, profile("7654321", "wb_user", Some("a@x.com")))
        .await
        .unwrap()
    else {
        panic!("expected LoggedIn");
    };

    assert_eq!(first.id, second.id);
    assert_eq!(identity_count(&db).await, 2);
    assert_eq!(account_count(&db).await, 1);
}

#[tokio::test]
async fn username_collision_gets_a_suffixed_name() {
    let (linker, db, _mailer) = setup().await;

    let now = chrono::Utc::now().naive_utc();
    local_accounts::ActiveModel {
        username: Set("octocat".to_string()),
        email: Set(Some("existing@x.com".to_string())),
        source: Set("register".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    let LinkOutcome::LoggedIn { account, .. } = linker
        .handle_callback(&github_stub(), profile("583231", "octocat", Some("new@x.com")))
        .await
        .unwrap()
    else {
        panic!("expected LoggedIn");
    };

    assert_ne!(account.username, "octocat");
    assert!(account.username.starts_with("octocat"));
    assert_eq!(account_count(&db).await, 2);
}

#[tokio::test]
async fn blank_display_name_falls_back_to_generated_name() {
    let (linker, _db, _mailer) = setup().await;

    let LinkOutcome::LoggedIn { account, .. } = linker
        .handle_callback(&github_stub(), profile("583231", "   ", Some("a@x.com")))
        .await
        .unwrap()
    else {
        panic!("expected LoggedIn");
    };
    assert!(account.username.starts_with("user"));
}

#[tokio::test]
async fn token_withholding_provider_stores_no_token() {
    let (linker, db, _mailer) = setup().await;

    let facebook = StubAdapter {
        kind: ProviderKind::Facebook,
        store_token: false,
    };
    let LinkOutcome::LoggedIn { identity_id, .. } = linker
        .handle_callback(&facebook, profile("10158", "Jo Face", Some("jo@fb.com")))
        .await
        .unwrap()
    else {
        panic!("expected LoggedIn");
    };

    let identity = LinkedIdentities::find_by_id(identity_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(identity.access_token, None);
    assert_eq!(identity.provider_type, "facebook");
}
