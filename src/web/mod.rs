//! # Web 层
//!
//! 路由、处理器与会话；所有端点挂在 `/oauth` 之下

pub mod handlers;
pub mod routes;
pub mod server;
pub mod session;

pub use server::{AppState, build_state, serve};
pub use session::{SESSION_COOKIE, SessionClaims, SessionIssuer};
