//! # Game Auth 主程序
//!
//! 加载配置、初始化存储与缓存并启动 HTTP 服务

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use game_auth::{
    AppContext, Result,
    api::ApiServer,
    config, lerror, linfo,
    logging::{self, LogComponent, LogStage},
};

/// 认证服务命令行参数
#[derive(Debug, Parser)]
#[command(name = "game-auth")]
#[command(about = "Authentication and session service for the multiplayer game server")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 config/config.{RUST_ENV}.toml）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别，未设置 RUST_LOG 时生效
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_level.as_deref());

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            lerror!(
                "system",
                LogStage::Configuration,
                LogComponent::Config,
                "config_load_failed",
                &format!("配置加载失败: {e:?}")
            );
            return Err(e);
        }
    };

    linfo!(
        "system",
        LogStage::Startup,
        LogComponent::Main,
        "service_starting",
        "服务启动",
        listen = config.listen_addr(),
        production = config.is_production,
    );

    let context = Arc::new(AppContext::from_config(config).await?);
    ApiServer::new(context).serve().await?;

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::Main,
        "service_shutdown",
        "服务正常关闭"
    );
    Ok(())
}
