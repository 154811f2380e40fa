//! # 日志配置模块
//!
//! 基于 tracing-subscriber 的日志初始化，日志级别由 RUST_LOG 控制

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// 初始化全局日志订阅器
///
/// 未设置 RUST_LOG 时默认 `info`，并压低 sqlx 查询日志
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
