use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use jobpilot::utils::logging;
use jobpilot::{
    AutoApplyRunner, ChromeSessionFactory, Config, HttpJobStore, LoginFlow, OrchestratorHandle,
    StdinManualStep, StopOutcome,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load("config.toml").context("加载配置失败")?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let limit = std::env::args()
        .nth(1)
        .and_then(|v| v.parse().ok())
        .unwrap_or(config.default_apply_limit);
    logging::log_startup(&config, limit);

    let store = HttpJobStore::new(&config.store_base_url).context("创建存储客户端失败")?;
    let sessions = ChromeSessionFactory::new(&config).reuse_tab(&config.login_success_fragment);
    let login = LoginFlow::new(&config, Arc::new(StdinManualStep));

    let runner = AutoApplyRunner::from_config(&config, Arc::new(store), Arc::new(sessions), login);
    let handle = OrchestratorHandle::new(runner, Duration::from_millis(config.stop_timeout_ms));

    // Ctrl+C 时请求停止，当前职位处理完后退出；再按一次 Ctrl+C 直接退出
    let summary = tokio::select! {
        result = handle.run_once(limit) => result?,
        _ = tokio::signal::ctrl_c() => {
            if handle.stop().await == StopOutcome::StopPending {
                info!("⏳ 等待当前职位处理完成，再按 Ctrl+C 立即退出");
                tokio::select! {
                    summary = handle.wait_idle() => summary,
                    _ = tokio::signal::ctrl_c() => handle.abandon().await,
                }
            } else {
                handle.status().progress.summary()
            }
        }
    };

    logging::print_final_stats(&summary, &config.output_log_file);

    Ok(())
}
