//! # OAuth 登录编排
//!
//! 入口 → 回调 →（可选邮箱补充）→ 会话建立。
//! 服务商未配置时静默回首页；适配器抛出的传输/解析错误在这一层
//! 折叠为统一出口，原始错误文本不外泄。

use crate::error::OauthError;
use crate::linker::LinkOutcome;
use crate::oauth::ProviderKind;
use crate::web::server::AppState;
use axum::Form;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use entity::local_accounts;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "type")]
    pub provider: Option<String>,
    pub next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(rename = "type")]
    pub provider: Option<String>,
    pub code: Option<String>,
    pub next_url: Option<String>,
    /// 令牌交换失败后的单次重试标记，随复合 redirect_uri 回传
    pub retry: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BindSuccessQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RequireEmailForm {
    pub email: String,
    pub oauthid: i32,
}

/// GET /oauth/oauthlogin?type=..&next_url=..
///
/// 服务商未知或未启用时直接回首页，不是错误
pub async fn oauth_login(State(state): State<AppState>, Query(query): Query<LoginQuery>) -> Response {
    let Some(adapter) = resolve_adapter(&state, query.provider.as_deref()).await else {
        return Redirect::to("/").into_response();
    };
    let next = safe_next_url(query.next_url.as_deref(), &state.config.site.domain);
    Redirect::to(&adapter.authorize_url(&next)).into_response()
}

/// GET /oauth/authorize?type=..&code=..
pub async fn authorize(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> Response {
    let Some(adapter) = resolve_adapter(&state, query.provider.as_deref()).await else {
        return Redirect::to("/").into_response();
    };
    let next = safe_next_url(query.next_url.as_deref(), &state.config.site.domain);

    let exchanged = match &query.code {
        Some(code) => adapter.exchange_code(code).await,
        None => Err(OauthError::token_exchange("callback missing code")),
    };
    let grant = match exchanged {
        Ok(grant) => grant,
        Err(e) => {
            tracing::warn!(provider = %adapter.kind(), error = %e, "令牌交换失败");
            // 单次重试：带标记再走一遍授权；已带标记说明重试也失败了
            if query.retry.is_some() {
                return Redirect::to("/").into_response();
            }
            return Redirect::to(&with_retry_marker(&adapter.authorize_url(&next))).into_response();
        }
    };

    let profile = match adapter.fetch_profile(&grant).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(provider = %adapter.kind(), error = %e, "资料拉取失败");
            return Redirect::to(&next).into_response();
        }
    };

    match state.linker.handle_callback(adapter.as_ref(), profile).await {
        Ok(LinkOutcome::LoggedIn { account, .. }) => logged_in_redirect(&state, &account, &next),
        Ok(LinkOutcome::PendingEmail { identity_id }) => {
            Redirect::to(&format!("/oauth/requireemail/{identity_id}.html")).into_response()
        }
        Err(e) => {
            tracing::error!(provider = %adapter.kind(), error = %e, "账户绑定失败");
            Redirect::to("/").into_response()
        }
    }
}

/// GET /oauth/requireemail/{oauthid}.html
pub async fn require_email_form(
    State(state): State<AppState>,
    Path(oauthid): Path<String>,
) -> Response {
    let Some(identity_id) = parse_html_id(&oauthid) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match state.linker.load_identity(identity_id).await {
        Ok(identity) => {
            let avatar = identity_avatar(&state, &identity).await;
            Html(require_email_page(identity_id, avatar.as_deref(), None)).into_response()
        }
        Err(OauthError::IdentityNotFound(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(&e),
    }
}

/// 身份头像：优先缓存列，缺失时从已存原始资料重取，不发网络请求
async fn identity_avatar(
    state: &AppState,
    identity: &entity::linked_identities::Model,
) -> Option<String> {
    if identity.avatar_url.is_some() {
        return identity.avatar_url.clone();
    }
    let raw = identity.raw_profile.as_deref()?;
    let kind = ProviderKind::parse(&identity.provider_type)?;
    let adapter = state.registry.get(kind).await.ok().flatten()?;
    adapter.extract_avatar(raw)
}

/// POST /oauth/requireemail/{oauthid}.html，表单 {email, oauthid}
pub async fn require_email_submit(
    State(state): State<AppState>,
    Form(form): Form<RequireEmailForm>,
) -> Response {
    match state.linker.submit_email(form.oauthid, &form.email).await {
        Ok(()) => Redirect::to(&format!(
            "/oauth/bindsuccess/{}.html?type=email",
            form.oauthid
        ))
        .into_response(),
        Err(OauthError::Validation(message)) => {
            let avatar = state
                .linker
                .load_identity(form.oauthid)
                .await
                .ok()
                .and_then(|identity| identity.avatar_url);
            Html(require_email_page(form.oauthid, avatar.as_deref(), Some(&message)))
                .into_response()
        }
        Err(OauthError::IdentityNotFound(_)) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => internal_error(&e),
    }
}

/// GET /oauth/emailconfirm/{id}/{sign}.html
///
/// 验签失败一律裸 403，不提示身份是否存在
pub async fn email_confirm(
    State(state): State<AppState>,
    Path((identity_id, sign)): Path<(i32, String)>,
) -> Response {
    let sign = sign.trim_end_matches(".html");
    match state.linker.confirm_email(identity_id, sign).await {
        Ok((account, identity)) => {
            let landing = format!("/oauth/bindsuccess/{}.html?type=success", identity.id);
            logged_in_redirect(&state, &account, &landing)
        }
        Err(OauthError::InvalidSignature | OauthError::IdentityNotFound(_)) => {
            StatusCode::FORBIDDEN.into_response()
        }
        Err(e) => internal_error(&e),
    }
}

/// GET /oauth/bindsuccess/{oauthid}.html?type={email|success}
pub async fn bind_success(
    State(state): State<AppState>,
    Path(oauthid): Path<String>,
    Query(query): Query<BindSuccessQuery>,
) -> Response {
    let Some(identity_id) = parse_html_id(&oauthid) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let identity = match state.linker.load_identity(identity_id).await {
        Ok(identity) => identity,
        Err(OauthError::IdentityNotFound(_)) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return internal_error(&e),
    };

    let (title, content) = if query.kind.as_deref() == Some("email") {
        (
            "Bind your email".to_string(),
            "Congratulations, the binding is just one step away. Please log in to your email \
             to check the email to complete the binding. Thank you."
                .to_string(),
        )
    } else {
        (
            "Binding successful".to_string(),
            format!(
                "Congratulations, you have successfully bound your email address. You can use \
                 {} to directly log in to this website without a password. You are welcome to \
                 continue to follow this site.",
                identity.provider_type
            ),
        )
    };
    Html(message_page(&title, &content)).into_response()
}

async fn resolve_adapter(
    state: &AppState,
    provider: Option<&str>,
) -> Option<std::sync::Arc<dyn crate::oauth::OauthAdapter>> {
    let kind = provider.and_then(ProviderKind::parse)?;
    match state.registry.get(kind).await {
        Ok(adapter) => adapter,
        Err(e) => {
            tracing::error!(provider = %kind, error = %e, "读取服务商配置失败");
            None
        }
    }
}

fn logged_in_redirect(state: &AppState, account: &local_accounts::Model, next: &str) -> Response {
    match state.sessions.session_cookie(account) {
        Ok(cookie) => {
            let mut response = Redirect::to(next).into_response();
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            response
        }
        Err(e) => internal_error(&e),
    }
}

fn internal_error(e: &OauthError) -> Response {
    tracing::error!(error = %e, "请求处理失败");
    (StatusCode::INTERNAL_SERVER_ERROR, "server error").into_response()
}

/// 解析形如 `5.html` 的路径段
fn parse_html_id(segment: &str) -> Option<i32> {
    segment.trim_end_matches(".html").parse().ok()
}

/// 校验回跳路径，杜绝开放重定向
///
/// 绝对地址的主机必须与本站域名一致（忽略 `www.` 前缀与端口）；
/// 登录页与空值归一为首页
pub(crate) fn safe_next_url(raw: Option<&str>, site_domain: &str) -> String {
    let Some(next) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return "/".to_string();
    };
    if next == "/login" || next == "/login/" {
        return "/".to_string();
    }

    if let Ok(url) = Url::parse(next) {
        let host = url.host_str().unwrap_or("");
        let site_host = site_domain.split(':').next().unwrap_or(site_domain);
        if host.trim_start_matches("www.") != site_host.trim_start_matches("www.") {
            tracing::info!(next_url = next, "拒绝站外回跳地址");
            return "/".to_string();
        }
        return next.to_string();
    }

    // 协议相对地址会被浏览器当作站外跳转
    if next.starts_with("//") || next.starts_with("/\\") {
        return "/".to_string();
    }
    next.to_string()
}

/// 给授权地址的复合 redirect_uri 打上重试标记
///
/// 标记随服务商回调原样返回，用来识别"重试也失败了"
pub(crate) fn with_retry_marker(auth_url: &str) -> String {
    let Ok(mut url) = Url::parse(auth_url) else {
        return auth_url.to_string();
    };
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs.into_iter().map(|(key, value)| {
            if key == "redirect_uri" {
                let sep = if value.contains('?') { '&' } else { '?' };
                (key, format!("{value}{sep}retry=1"))
            } else {
                (key, value)
            }
        }));
    url.to_string()
}

fn require_email_page(identity_id: i32, avatar_url: Option<&str>, error: Option<&str>) -> String {
    let avatar = avatar_url
        .map(|url| format!("<img src=\"{url}\" alt=\"avatar\" width=\"64\"/>"))
        .unwrap_or_default();
    let error_html = error
        .map(|msg| format!("<p class=\"error\">{msg}</p>"))
        .unwrap_or_default();
    message_page(
        "Bind your email",
        &format!(
            "{avatar}{error_html}\
             <form method=\"post\" action=\"/oauth/requireemail/{identity_id}.html\">\
             <input type=\"email\" name=\"email\" placeholder=\"email\" required/>\
             <input type=\"hidden\" name=\"oauthid\" value=\"{identity_id}\"/>\
             <button type=\"submit\">Submit</button>\
             </form>"
        ),
    )
}

fn message_page(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"/><title>{title}</title></head>\
         <body><h1>{title}</h1><div>{content}</div></body></html>"
    )
}
