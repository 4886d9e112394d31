//! 主应用程序入口
//!
//! 加载配置、打开存储、启动在线状态清理任务与 Axum Web API 服务。

use std::sync::Arc;

use anyhow::Context;
use application::{Clock, PresenceReaper, ReaperConfig, SystemClock};
use config::AppConfig;
use infrastructure::Infrastructure;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志，默认 info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("加载配置失败")?;
    tracing::info!(config = %config.sanitize(), "配置已加载");

    let infrastructure = Infrastructure::open(&config)
        .await
        .context("打开存储失败")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::from_repositories(
        infrastructure.participant_repository.clone(),
        infrastructure.message_repository.clone(),
        clock.clone(),
    );

    let reaper = Arc::new(PresenceReaper::new(
        state.participant_service.clone(),
        infrastructure.message_repository.clone(),
        clock,
        ReaperConfig::from(&config.presence),
    ));
    let reaper_handle = reaper.spawn();

    let app = router(state, &config.server.cors_origins);
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("无法监听 {address}"))?;

    tracing::info!("聊天室服务器启动在 http://{}", address);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    reaper_handle.shutdown().await;
    infrastructure.close().await;
    tracing::info!("服务器已停止");

    served.context("HTTP 服务异常退出")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "无法监听退出信号");
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，正在关闭");
}
