//! 日志工具模块
//!
//! 订阅器初始化，以及启动 / 结束时的横幅输出

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::RunSummary;

/// 初始化 tracing 订阅器
///
/// 优先使用 `RUST_LOG`，否则默认 info（verbose 时为 debug）。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, limit: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 自动投递模式");
    info!("🌐 浏览器模式: {:?}", config.browser_mode);
    info!("🗄️ 职位存储: {}", config.store_base_url);
    info!("📊 本批上限: {}", limit);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 自动投递完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.successful, summary.processed);
    info!("❌ 未成功: {}", summary.processed - summary.successful);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
