//! # OAuth 登录服务主程序

use blog_oauth::{AppConfig, Result, database, logging, web};
use clap::Parser;
use std::path::PathBuf;

/// 第三方登录服务
#[derive(Debug, Parser)]
#[command(name = "blog-oauth", version, about)]
struct Cli {
    /// 配置文件路径
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    let db = database::init_database(&config.database.url, config.database.max_connections).await?;
    tracing::info!("执行数据库迁移...");
    database::run_migrations(&db).await?;

    let state = web::build_state(config, db)?;
    web::serve(state).await
}
