//! # 路由配置

use crate::web::handlers;
use crate::web::server::AppState;
use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// 创建所有路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .nest("/oauth", oauth_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// OAuth 登录路由
fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/oauthlogin", get(handlers::oauth::oauth_login))
        .route("/authorize", get(handlers::oauth::authorize))
        .route(
            "/requireemail/{oauthid}",
            get(handlers::oauth::require_email_form).post(handlers::oauth::require_email_submit),
        )
        .route("/emailconfirm/{id}/{sign}", get(handlers::oauth::email_confirm))
        .route("/bindsuccess/{oauthid}", get(handlers::oauth::bind_success))
}
